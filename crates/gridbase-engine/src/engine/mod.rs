//! Formula engine API.
//!
//! This module provides the expression evaluator used by formula fields:
//!
//! - [`Value`] - The closed value type shared with record documents
//! - [`compile`], [`evaluate`], [`Formula`] - Parse and evaluate expressions
//! - [`FieldResolver`] - Per-row lookup of `{Field}` references
//! - [`coerce_result_type`], [`ResultType`] - Formula field result coercion
//! - [`extract_field_refs`] - Find the fields a formula reads
//! - [`format_value`] - Format values for display

mod coerce;
mod deps;
mod eval;
mod format;
mod lexer;
mod parser;
mod value;

pub use coerce::{ResultType, coerce_result_type};
pub use deps::extract_field_refs;
pub use eval::{FieldResolver, Formula, compile, evaluate};
pub use format::{format_number, format_value};
pub use value::Value;
