//! In-memory storage backend.
//!
//! Same lane semantics as [`SledStorage`](crate::SledStorage) with a plain
//! hash map as the "durable" base. Useful for contract-level tests that do
//! not care about actual durability.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::error::StorageResult;
use crate::lane::{Lane, LaneSet};
use crate::Storage;

/// Hash-map-backed implementation of [`Storage`].
#[derive(Default)]
pub struct MemStorage {
    base: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    protected: Mutex<HashMap<String, Vec<u8>>>,
    lanes: Mutex<LaneSet>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self {
            base: Mutex::new(HashMap::new()),
            protected: Mutex::new(HashMap::new()),
            lanes: Mutex::new(LaneSet::new()),
        }
    }

    fn lanes(&self) -> MutexGuard<'_, LaneSet> {
        self.lanes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for MemStorage {
    fn switch_to(&self, lane: Lane) {
        self.lanes().switch_to(lane);
    }

    fn put(&self, key: &[u8], val: &[u8]) -> StorageResult<()> {
        self.lanes().put(key, val);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        if let Some(write) = self.lanes().lookup(key) {
            return Ok(write);
        }
        let base = self.base.lock().unwrap_or_else(|e| e.into_inner());
        Ok(base.get(key).cloned())
    }

    fn del(&self, key: &[u8]) -> StorageResult<()> {
        self.lanes().del(key);
        Ok(())
    }

    fn flush(&self) -> StorageResult<()> {
        self.lanes().flush();
        Ok(())
    }

    fn reset(&self) {
        self.lanes().reset();
    }

    fn commit_block(&self) -> StorageResult<()> {
        let committable = self.lanes().take_committable();
        let mut base = self.base.lock().unwrap_or_else(|e| e.into_inner());
        for (key, write) in committable {
            match write {
                Some(val) => {
                    base.insert(key, val);
                }
                None => {
                    base.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn save_protected_key(&self, key: &str, val: &[u8]) -> StorageResult<()> {
        self.protected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), val.to_vec());
        Ok(())
    }

    fn get_protected_key(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self
            .protected
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_lane_is_always_discarded() {
        let store = MemStorage::new();
        store.switch_to(Lane::Query);
        store.put(b"k", b"v").unwrap();
        store.flush().unwrap();
        store.reset();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn transaction_lane_accumulates_across_flushes() {
        let store = MemStorage::new();
        store.put(b"a", b"1").unwrap();
        store.flush().unwrap();
        store.reset(); // end of one call
        store.put(b"b", b"2").unwrap();
        store.flush().unwrap();
        store.reset(); // end of another

        // Both flushed writes are visible pre-commit, in-lane only.
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(store.get(b"b").unwrap(), Some(b"2".to_vec()));
        store.switch_to(Lane::Query);
        assert_eq!(store.get(b"a").unwrap(), None);

        store.switch_to(Lane::Transaction);
        store.commit_block().unwrap();
        store.switch_to(Lane::Query);
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
    }
}
