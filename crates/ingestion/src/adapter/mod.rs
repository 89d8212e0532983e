//! Source adapters exposing array and document sources to the evaluator.

mod array;
mod document;

pub use array::{ArrayAdapter, ArrayCursor, ARRAY_FLOAT_DIGITS};
pub use document::{
    resolve_path, DocumentAdapter, ImportPathError, PathError, DOCUMENT_FLOAT_DIGITS,
};

use mapping::AccessError;

fn expect_args(args: &[&str], expected: usize) -> Result<(), AccessError> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(AccessError::Arity {
            expected,
            actual: args.len(),
        })
    }
}
