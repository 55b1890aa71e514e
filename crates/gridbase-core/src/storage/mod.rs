//! Access to field values on linked records.

mod memory;

pub use memory::MemoryStore;

use uuid::Uuid;

use gridbase_engine::Value;

use crate::error::Result;

/// Fetches field values from the records a Lookup or Rollup links to.
///
/// Implementations return the stored (possibly null) value of `field_id` for
/// each record in `ids` that exists, in `ids` order. Ids with no record are
/// skipped. An error fails only the field being computed.
pub trait LinkedValueSource: Sync {
    fn fetch_field_values(&self, ids: &[Uuid], field_id: Uuid) -> Result<Vec<Value>>;
}
