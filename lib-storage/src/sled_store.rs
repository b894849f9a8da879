//! Sled-backed durable storage.
//!
//! Lane overlays live in memory; only `commit_block` crosses the
//! durability boundary, applying the Transaction lane's flushed writes in
//! one atomic batch. Protected keys go to a separate metadata tree and are
//! written through immediately.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use sled::Batch;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::lane::{Lane, LaneSet};
use crate::Storage;

// Tree names are protocol. Changing them breaks existing databases.
const TREE_STATE: &str = "state";
const TREE_META: &str = "meta";

/// Sled-based implementation of [`Storage`].
pub struct SledStorage {
    db: sled::Db,
    state: sled::Tree,
    meta: sled::Tree,
    lanes: Mutex<LaneSet>,
}

impl SledStorage {
    /// Open or create a store at the given path. Failure here is fatal to
    /// the node.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let db = sled::open(path).map_err(|e| StorageError::Database(e.to_string()))?;
        Self::with_db(db)
    }

    /// Open a throwaway in-memory store (tests).
    pub fn open_temporary() -> StorageResult<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Self::with_db(db)
    }

    fn with_db(db: sled::Db) -> StorageResult<Self> {
        let state = db
            .open_tree(TREE_STATE)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let meta = db
            .open_tree(TREE_META)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        info!("storage opened");
        Ok(Self {
            db,
            state,
            meta,
            lanes: Mutex::new(LaneSet::new()),
        })
    }

    fn lanes(&self) -> MutexGuard<'_, LaneSet> {
        // Single-threaded callers; recover rather than poison-cascade.
        self.lanes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Storage for SledStorage {
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
        let found = self
            .state
            .get(key)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(found.map(|ivec| ivec.to_vec()))
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
        let count = committable.len();

        let mut batch = Batch::default();
        for (key, write) in committable {
            match write {
                Some(val) => batch.insert(key, val),
                None => batch.remove(key),
            }
        }
        self.state
            .apply_batch(batch)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!(keys = count, "block committed to durable storage");
        Ok(())
    }

    fn save_protected_key(&self, key: &str, val: &[u8]) -> StorageResult<()> {
        self.meta
            .insert(key.as_bytes(), val)
            .map_err(|e| StorageError::Database(e.to_string()))?;
        self.db
            .flush()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(())
    }

    fn get_protected_key(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let found = self
            .meta
            .get(key.as_bytes())
            .map_err(|e| StorageError::Database(e.to_string()))?;
        Ok(found.map(|ivec| ivec.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flushed_write_survives_commit() {
        let store = SledStorage::open_temporary().unwrap();
        store.put(b"k", b"v").unwrap();
        store.flush().unwrap();
        store.commit_block().unwrap();
        assert_eq!(store.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn unflushed_write_is_dropped_by_commit() {
        let store = SledStorage::open_temporary().unwrap();
        store.put(b"k", b"v").unwrap();
        store.commit_block().unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn check_lane_writes_never_reach_durable_state() {
        let store = SledStorage::open_temporary().unwrap();
        store.switch_to(Lane::Check);
        store.put(b"k", b"check").unwrap();
        store.flush().unwrap();
        store.reset();

        store.switch_to(Lane::Transaction);
        store.commit_block().unwrap();
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn deletion_tombstone_commits() {
        let store = SledStorage::open_temporary().unwrap();
        store.put(b"k", b"v").unwrap();
        store.flush().unwrap();
        store.commit_block().unwrap();

        store.del(b"k").unwrap();
        store.flush().unwrap();
        // Tombstone shadows the durable value before commit...
        assert_eq!(store.get(b"k").unwrap(), None);
        store.commit_block().unwrap();
        // ...and removes it after.
        assert_eq!(store.get(b"k").unwrap(), None);
    }

    #[test]
    fn protected_keys_bypass_lanes_and_reset() {
        let store = SledStorage::open_temporary().unwrap();
        store.switch_to(Lane::Query);
        store.save_protected_key("height", &[1, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        store.reset();
        assert_eq!(
            store.get_protected_key("height").unwrap(),
            Some(vec![1, 0, 0, 0, 0, 0, 0, 0])
        );
        // Protected keys are invisible to lane reads.
        assert_eq!(store.get(b"height").unwrap(), None);
    }
}
