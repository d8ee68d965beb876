//! Durable record store: one JSON document per collection under a data
//! directory. Writes go through a temp file and an atomic rename so a crash
//! mid-write never corrupts a collection.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{Collection, QueryOrder, Record, RecordStore, StoreError};

/// File-backed store with a write-through in-memory cache. All operations run
/// under one mutex, which is what makes `modify` an atomic read-modify-write.
pub struct JsonFileStore {
    dir: PathBuf,
    cache: Mutex<HashMap<String, Collection>>,
}

impl JsonFileStore {
    /// Open (or create) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cache: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        // Collection names are internal identifiers; keep the mapping dumb.
        self.dir.join(format!("{collection}.json"))
    }

    fn load(&self, collection: &str) -> Collection {
        let path = self.collection_path(collection);
        let Ok(raw) = fs::read_to_string(&path) else {
            return Collection::default();
        };
        match serde_json::from_str(&raw) {
            Ok(col) => col,
            Err(e) => {
                tracing::warn!(collection, error = %e, "unreadable collection file, starting empty");
                Collection::default()
            }
        }
    }

    fn flush(&self, collection: &str, col: &Collection) -> Result<(), StoreError> {
        let path = self.collection_path(collection);
        let json = serde_json::to_string(col)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn with_collection<T>(
        &self,
        collection: &str,
        write_back: bool,
        f: impl FnOnce(&mut Collection) -> T,
    ) -> Result<T, StoreError> {
        let mut guard = self
            .cache
            .lock()
            .map_err(|e| StoreError::Persistence(format!("store lock poisoned: {e}")))?;
        let col = guard
            .entry(collection.to_string())
            .or_insert_with(|| self.load(collection));
        let out = f(col);
        if write_back {
            self.flush(collection, col)?;
        }
        Ok(out)
    }
}

impl RecordStore for JsonFileStore {
    fn get(&self, collection: &str, key: &str) -> Result<Option<Record>, StoreError> {
        self.with_collection(collection, false, |c| c.get(key).cloned())
    }

    fn put(&self, collection: &str, key: &str, record: Record) -> Result<(), StoreError> {
        self.with_collection(collection, true, |c| c.put(key, record))
    }

    fn append(&self, collection: &str, record: Record) -> Result<(), StoreError> {
        self.with_collection(collection, true, |c| c.append(record))
    }

    fn query(
        &self,
        collection: &str,
        filter: Option<&dyn Fn(&Record) -> bool>,
        limit: usize,
        order: QueryOrder,
    ) -> Result<Vec<Record>, StoreError> {
        self.with_collection(collection, false, |c| c.query(filter, limit, order))
    }

    fn modify(
        &self,
        collection: &str,
        key: &str,
        apply: &mut dyn FnMut(Option<&Record>) -> Record,
    ) -> Result<Record, StoreError> {
        self.with_collection(collection, true, |c| {
            let updated = apply(c.get(key));
            c.put(key, updated.clone());
            updated
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_dir() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let store = JsonFileStore::open(&dir).unwrap();
        assert!(store.dir().exists());
    }

    #[test]
    fn test_put_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonFileStore::open(tmp.path()).unwrap();
            store.put("signals", "juice", json!({"value": 0.2})).unwrap();
        }
        let store = JsonFileStore::open(tmp.path()).unwrap();
        let rec = store.get("signals", "juice").unwrap().unwrap();
        assert_eq!(rec["value"], 0.2);
    }

    #[test]
    fn test_append_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let store = JsonFileStore::open(tmp.path()).unwrap();
            store.append("audit", json!({"n": 1})).unwrap();
            store.append("audit", json!({"n": 2})).unwrap();
        }
        let store = JsonFileStore::open(tmp.path()).unwrap();
        let rows = store.query("audit", None, 10, QueryOrder::Oldest).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["n"], 2);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("signals.json"), "{not json").unwrap();
        let store = JsonFileStore::open(tmp.path()).unwrap();
        assert!(store.get("signals", "x").unwrap().is_none());
    }

    #[test]
    fn test_modify_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::open(tmp.path()).unwrap();
        store
            .modify("signals", "net_flow", &mut |cur| {
                assert!(cur.is_none());
                json!({"value": 1.0})
            })
            .unwrap();
        let out = store
            .modify("signals", "net_flow", &mut |cur| {
                let v = cur.and_then(|r| r["value"].as_f64()).unwrap();
                json!({ "value": v + 1.0 })
            })
            .unwrap();
        assert_eq!(out["value"], 2.0);
    }
}
