//! Record store abstraction backing adaptive state and audit logging.
//!
//! The core never depends on a concrete storage schema: components take an
//! optional store handle and degrade to documented stateless fallbacks when
//! none is configured. Every stateful update goes through [`RecordStore::modify`],
//! a single atomic read-modify-write per key, so concurrent analyses cannot
//! drop each other's writes.

mod json_file;
mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored record. Schemaless JSON keeps the store decoupled from the core.
pub type Record = serde_json::Value;

/// Storage errors. Persistence failures never abort an analysis; the
/// orchestrator downgrades them to warnings.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not durably persist a write
    #[error("persistence failure: {0}")]
    Persistence(String),
    /// A record could not be encoded or decoded
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Underlying filesystem error
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordering for [`RecordStore::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrder {
    /// Insertion order
    Oldest,
    /// Reverse insertion order
    Newest,
}

/// Minimal CRUD contract used by the EWMA store, pattern memory and audit
/// logging.
pub trait RecordStore: Send + Sync {
    /// Fetch a keyed record, `None` when absent.
    fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError>;

    /// Insert or replace a keyed record.
    fn put(&self, collection: &str, key: &str, record: Record) -> Result<(), StoreError>;

    /// Append an unkeyed record to a collection log.
    fn append(&self, collection: &str, record: Record) -> Result<(), StoreError>;

    /// List records in a collection, optionally filtered, bounded by `limit`.
    fn query(
        &self,
        collection: &str,
        filter: Option<&dyn Fn(&Record) -> bool>,
        limit: usize,
        order: QueryOrder,
    ) -> Result<Vec<Record>, StoreError>;

    /// Atomic read-modify-write on a single keyed record. The closure sees the
    /// current record (if any) and returns the replacement, which is persisted
    /// and echoed back.
    fn modify(
        &self,
        collection: &str,
        key: &str,
        apply: &mut dyn FnMut(Option<&Record>) -> Record,
    ) -> Result<Record, StoreError>;
}

/// In-memory representation of one collection: an insertion-ordered log with
/// a key index over the keyed entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collection {
    records: Vec<Record>,
    #[serde(default)]
    keys: HashMap<String, usize>,
}

impl Collection {
    pub(crate) fn get(&self, key: &str) -> Option<&Record> {
        self.keys.get(key).and_then(|i| self.records.get(*i))
    }

    pub(crate) fn put(&mut self, key: &str, record: Record) {
        match self.keys.get(key) {
            Some(i) => self.records[*i] = record,
            None => {
                self.keys.insert(key.to_string(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub(crate) fn append(&mut self, record: Record) {
        self.records.push(record);
    }

    pub(crate) fn query(
        &self,
        filter: Option<&dyn Fn(&Record) -> bool>,
        limit: usize,
        order: QueryOrder,
    ) -> Vec<Record> {
        let matches = |r: &&Record| filter.map(|f| f(r)).unwrap_or(true);
        match order {
            QueryOrder::Oldest => self
                .records
                .iter()
                .filter(matches)
                .take(limit)
                .cloned()
                .collect(),
            QueryOrder::Newest => self
                .records
                .iter()
                .rev()
                .filter(matches)
                .take(limit)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_collection_put_replaces() {
        let mut c = Collection::default();
        c.put("a", json!({"v": 1}));
        c.put("a", json!({"v": 2}));
        assert_eq!(c.get("a").unwrap()["v"], 2);
        assert_eq!(c.records.len(), 1);
    }

    #[test]
    fn test_collection_append_and_query_newest() {
        let mut c = Collection::default();
        for i in 0..5 {
            c.append(json!({"i": i}));
        }
        let out = c.query(None, 2, QueryOrder::Newest);
        assert_eq!(out[0]["i"], 4);
        assert_eq!(out[1]["i"], 3);
    }

    #[test]
    fn test_collection_query_filtered() {
        let mut c = Collection::default();
        for i in 0..6 {
            c.append(json!({"i": i}));
        }
        let filter = |r: &Record| r["i"].as_i64().unwrap() % 2 == 0;
        let out = c.query(Some(&filter), 10, QueryOrder::Oldest);
        assert_eq!(out.len(), 3);
    }
}
