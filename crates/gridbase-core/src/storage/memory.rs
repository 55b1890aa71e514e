//! In-memory record store.

use std::collections::HashSet;

use dashmap::DashMap;
use uuid::Uuid;

use gridbase_engine::Value;

use super::LinkedValueSource;
use crate::error::Result;
use crate::model::Record;

/// Thread-safe sparse storage for records, keyed by record id.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: DashMap<Uuid, Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, returning the one it replaced.
    pub fn insert(&self, record: Record) -> Option<Record> {
        self.records.insert(record.id, record)
    }

    pub fn extend(&self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.insert(record);
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Record> {
        self.records.get(&id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: Uuid) -> Option<Record> {
        self.records.remove(&id).map(|(_, record)| record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<Record> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let store = MemoryStore::new();
        store.extend(iter);
        store
    }
}

impl LinkedValueSource for MemoryStore {
    /// Behaves like `WHERE id IN (...)`: each record contributes once even
    /// when its id is listed twice.
    fn fetch_field_values(&self, ids: &[Uuid], field_id: Uuid) -> Result<Vec<Value>> {
        let mut seen = HashSet::with_capacity(ids.len());
        let values = ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| self.records.get(id))
            .map(|entry| entry.value().get(field_id))
            .collect();
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_get_remove() {
        let store = MemoryStore::new();
        assert!(store.is_empty());

        let record = Record::new(Uuid::new_v4());
        let id = record.id;
        assert_eq!(store.insert(record.clone()), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(id), Some(record.clone()));
        assert_eq!(store.remove(id), Some(record));
        assert_eq!(store.get(id), None);
    }

    #[test]
    fn test_fetch_skips_missing_records_and_keeps_nulls() {
        let table = Uuid::new_v4();
        let price = Uuid::new_v4();
        let a = Record::new(table).with_value(price, 3);
        let b = Record::new(table);
        let store: MemoryStore = [a.clone(), b.clone()].into_iter().collect();

        let values = store
            .fetch_field_values(&[b.id, Uuid::new_v4(), a.id], price)
            .unwrap();
        assert_eq!(values, vec![Value::Null, Value::Number(3.0)]);
    }

    #[test]
    fn test_fetch_returns_each_record_once() {
        let price = Uuid::new_v4();
        let a = Record::new(Uuid::new_v4()).with_value(price, 5);
        let store = MemoryStore::from_iter([a.clone()]);

        let values = store.fetch_field_values(&[a.id, a.id], price).unwrap();
        assert_eq!(values, vec![Value::Number(5.0)]);
    }
}
