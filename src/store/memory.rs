//! In-memory record store. State lives for the life of the process; used by
//! tests and by deployments that opt out of durable storage.

use std::collections::HashMap;
use std::sync::Mutex;

use super::{Collection, QueryOrder, Record, RecordStore, StoreError};

/// Mutex-guarded in-memory store. The single lock makes every
/// read-modify-write atomic with respect to concurrent analyses.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_collections<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, Collection>) -> T,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|e| StoreError::Persistence(format!("store lock poisoned: {e}")))?;
        Ok(f(&mut guard))
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        self.with_collections(|cols| {
            cols.get(collection).and_then(|c| c.get(key)).cloned()
        })
    }

    fn put(&self, collection: &str, key: &str, record: Record) -> Result<(), StoreError> {
        self.with_collections(|cols| {
            cols.entry(collection.to_string()).or_default().put(key, record);
        })
    }

    fn append(&self, collection: &str, record: Record) -> Result<(), StoreError> {
        self.with_collections(|cols| {
            cols.entry(collection.to_string()).or_default().append(record);
        })
    }

    fn query(
        &self,
        collection: &str,
        filter: Option<&dyn Fn(&Record) -> bool>,
        limit: usize,
        order: QueryOrder,
    ) -> Result<Vec<Record>, StoreError> {
        self.with_collections(|cols| {
            cols.get(collection)
                .map(|c| c.query(filter, limit, order))
                .unwrap_or_default()
        })
    }

    fn modify(
        &self,
        collection: &str,
        key: &str,
        apply: &mut dyn FnMut(Option<&Record>) -> Record,
    ) -> Result<Record, StoreError> {
        self.with_collections(|cols| {
            let col = cols.entry(collection.to_string()).or_default();
            let updated = apply(col.get(key));
            col.put(key, updated.clone());
            updated
        })
    }
}
