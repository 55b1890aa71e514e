//! gridbase_engine - Formula tokenizer, parser, evaluator and builtins.

pub mod builtins;
pub mod engine;
pub mod error;

pub use engine::{FieldResolver, Formula, ResultType, Value, compile, evaluate};
pub use error::{FormulaError, Result};
