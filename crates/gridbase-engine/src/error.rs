//! Error types for formula parsing and evaluation.

use thiserror::Error;

/// Errors raised while compiling or evaluating a formula.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormulaError {
    #[error("Parse error at offset {offset}: {message}")]
    Parse { offset: usize, message: String },

    #[error("Unexpected end of formula")]
    UnexpectedEnd,

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{function} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        function: String,
        expected: &'static str,
        got: usize,
    },

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid argument to {function}: {message}")]
    InvalidArgument { function: String, message: String },
}

impl FormulaError {
    pub(crate) fn parse(offset: usize, message: impl Into<String>) -> Self {
        FormulaError::Parse {
            offset,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FormulaError>;
