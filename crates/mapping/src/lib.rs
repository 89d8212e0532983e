//! Declarative mapping from self-describing sources onto import records.
//!
//! A mapping file names the templates used to build records and reference
//! entities. Each template entry is an expression such as
//! `JSON $.value !float|CONST 0 !float`, evaluated by [`Evaluator`] against
//! any [`SourceAdapter`].

pub mod config;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod time;

pub use config::{MappingConfig, Template, IMPORT_TEMPLATE};
pub use convert::ValueType;
pub use error::{AccessError, ExpressionError, FieldError, MappingError, MappingResult};
pub use evaluator::{Evaluator, SourceAdapter};
pub use time::{TimeConverter, TimeFormatter};
