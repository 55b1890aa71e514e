//! Table schema and row types.

mod field;
mod record;

pub use field::{Field, FieldKind, FormulaOptions, LinkedRecordOptions, LookupOptions, RollupOptions};
pub use record::{Record, ValueMap};
