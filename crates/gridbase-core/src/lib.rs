//! gridbase-core - Computed field orchestration over table records.

pub mod compute;
pub mod error;
pub mod model;
pub mod storage;

pub use compute::{
    Aggregation, ComputeOptions, FieldComputer, aggregate, compute_fields_for_records,
    extract_record_ids,
};
pub use error::{CoreError, Result};
pub use model::{Field, FieldKind, Record};
pub use storage::{LinkedValueSource, MemoryStore};

pub use gridbase_engine::Value;
