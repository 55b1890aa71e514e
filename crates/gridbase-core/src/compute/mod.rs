//! Batch computation of Formula, Lookup and Rollup fields.
//!
//! - [`FieldComputer`], [`compute_fields_for_records`] - Per-record computation loop
//! - [`aggregate`], [`Aggregation`] - Rollup aggregation functions
//! - [`extract_record_ids`] - Read record ids out of linked-record values

mod aggregate;
mod computer;
mod links;
mod plan;

pub use aggregate::{Aggregation, aggregate};
pub use computer::{ComputeOptions, FieldComputer, compute_fields_for_records};
pub use links::extract_record_ids;
