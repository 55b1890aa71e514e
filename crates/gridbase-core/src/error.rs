//! Error types for computed field orchestration.

use thiserror::Error;
use uuid::Uuid;

use gridbase_engine::FormulaError;

/// Errors that can occur while computing a single field of a single record.
///
/// None of these abort a batch: the orchestrator downgrades them to a null
/// value for the affected field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Formula error: {0}")]
    Formula(#[from] FormulaError),

    #[error("Field {field} is missing the {option} option")]
    MissingOption { field: Uuid, option: &'static str },

    #[error("Field {0} is not in the table's field catalog")]
    UnknownField(Uuid),

    #[error("Field {field} links through {linked}, which does not hold record ids")]
    NotLinkField { field: Uuid, linked: Uuid },

    #[error("Unknown aggregation function: {0}")]
    UnknownAggregation(String),

    #[error("Linked record fetch failed: {0}")]
    Fetch(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
