//! Lexical helpers for the expression language.
//!
//! ```text
//! expr := alt ('|' alt)*
//! alt  := accessor (' ' arg)* (' !' type)?
//! ```
//!
//! Parenthesized groups embed a nested expression whose rendered result is
//! spliced into the surrounding alt before it is parsed.

use crate::error::{AccessError, ExpressionError};

/// Split an expression into alts on `|` at parenthesis depth zero.
///
/// Always yields at least one (possibly empty) alt.
pub fn split_alts(expr: &str) -> Vec<&str> {
    let mut alts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in expr.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                alts.push(&expr[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    alts.push(&expr[start..]);
    alts
}

/// Replace every top-level balanced `( ... )` group in `alt` with `eval(inner)`.
pub fn substitute_groups<F>(alt: &str, mut eval: F) -> Result<String, ExpressionError>
where
    F: FnMut(&str) -> Result<String, ExpressionError>,
{
    if !alt.contains('(') && !alt.contains(')') {
        return Ok(alt.to_string());
    }

    let unbalanced = || ExpressionError::new(alt, "", AccessError::Unbalanced);
    let mut out = String::with_capacity(alt.len());
    let mut depth = 0usize;
    let mut group_start = 0;

    for (i, c) in alt.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    group_start = i + 1;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(unbalanced());
                }
                depth -= 1;
                if depth == 0 {
                    out.push_str(&eval(&alt[group_start..i])?);
                }
            }
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    if depth != 0 {
        return Err(unbalanced());
    }
    Ok(out)
}

/// A parsed alt: accessor, arguments and the raw type suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alt<'a> {
    pub accessor: &'a str,
    pub args: Vec<&'a str>,
    pub value_type: &'a str,
}

impl<'a> Alt<'a> {
    /// Tokenize on single spaces. A trailing `!type` token sets the type (default `str`).
    pub fn parse(alt: &'a str) -> Self {
        let mut tokens = alt.split(' ');
        let accessor = tokens.next().unwrap_or_default();
        let mut args: Vec<&str> = tokens.collect();

        let value_type = match args.last() {
            Some(last) if last.starts_with('!') => {
                let type_name = &last[1..];
                args.pop();
                type_name
            }
            _ => "str",
        };

        Self {
            accessor,
            args,
            value_type,
        }
    }
}
