//! In-memory lane overlays shared by every storage backend.

use std::collections::HashMap;

/// One of three isolated transactional views over the same key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lane {
    /// Block application. The only lane that may ever be committed.
    Transaction,
    /// Speculative validation. Never committed.
    Check,
    /// Read-only queries. Never committed.
    Query,
}

impl Lane {
    fn index(self) -> usize {
        match self {
            Lane::Transaction => 0,
            Lane::Check => 1,
            Lane::Query => 2,
        }
    }
}

/// A write is either a value or a deletion tombstone.
type Write = Option<Vec<u8>>;

/// Per-lane overlay: `staged` holds writes since the last flush (invisible
/// to reads), `applied` holds flushed writes (visible to reads in this
/// lane only).
#[derive(Debug, Default)]
struct LaneBuf {
    staged: HashMap<Vec<u8>, Write>,
    applied: HashMap<Vec<u8>, Write>,
}

/// The three lane overlays plus the active-lane selector. Backends embed
/// this behind a mutex and layer it over their durable base.
#[derive(Debug)]
pub(crate) struct LaneSet {
    active: Lane,
    lanes: [LaneBuf; 3],
}

impl Default for LaneSet {
    fn default() -> Self {
        Self::new()
    }
}

impl LaneSet {
    pub fn new() -> Self {
        Self {
            active: Lane::Transaction,
            lanes: [LaneBuf::default(), LaneBuf::default(), LaneBuf::default()],
        }
    }

    pub fn switch_to(&mut self, lane: Lane) {
        self.active = lane;
    }

    fn active_buf(&mut self) -> &mut LaneBuf {
        &mut self.lanes[self.active.index()]
    }

    pub fn put(&mut self, key: &[u8], val: &[u8]) {
        self.active_buf().staged.insert(key.to_vec(), Some(val.to_vec()));
    }

    pub fn del(&mut self, key: &[u8]) {
        self.active_buf().staged.insert(key.to_vec(), None);
    }

    /// Look a key up in the active lane's flushed overlay.
    ///
    /// `Some(None)` means "deleted here" (do not fall through to the
    /// durable base); `None` means the overlay has no opinion.
    pub fn lookup(&self, key: &[u8]) -> Option<Write> {
        self.lanes[self.active.index()].applied.get(key).cloned()
    }

    /// Promote the active lane's staged writes into its applied overlay.
    pub fn flush(&mut self) {
        let buf = self.active_buf();
        for (key, write) in buf.staged.drain() {
            buf.applied.insert(key, write);
        }
    }

    /// Discard the active lane's staged writes. Check and Query lanes are
    /// rebuilt fresh per call, so their applied overlays go too.
    pub fn reset(&mut self) {
        let lane = self.active;
        let buf = self.active_buf();
        buf.staged.clear();
        if matches!(lane, Lane::Check | Lane::Query) {
            buf.applied.clear();
        }
    }

    /// Drain the Transaction lane's applied overlay for durable commit and
    /// reopen every lane fresh.
    pub fn take_committable(&mut self) -> HashMap<Vec<u8>, Write> {
        let committable =
            std::mem::take(&mut self.lanes[Lane::Transaction.index()].applied);
        for buf in &mut self.lanes {
            buf.staged.clear();
            buf.applied.clear();
        }
        committable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_writes_invisible_until_flush() {
        let mut lanes = LaneSet::new();
        lanes.put(b"k", b"v");
        assert_eq!(lanes.lookup(b"k"), None);
        lanes.flush();
        assert_eq!(lanes.lookup(b"k"), Some(Some(b"v".to_vec())));
    }

    #[test]
    fn reset_discards_staged_only_in_transaction_lane() {
        let mut lanes = LaneSet::new();
        lanes.put(b"flushed", b"1");
        lanes.flush();
        lanes.put(b"staged", b"2");
        lanes.reset();
        assert_eq!(lanes.lookup(b"flushed"), Some(Some(b"1".to_vec())));
        assert_eq!(lanes.lookup(b"staged"), None);
    }

    #[test]
    fn reset_clears_check_lane_entirely() {
        let mut lanes = LaneSet::new();
        lanes.switch_to(Lane::Check);
        lanes.put(b"k", b"v");
        lanes.flush();
        lanes.reset();
        assert_eq!(lanes.lookup(b"k"), None);
    }

    #[test]
    fn lanes_do_not_observe_each_other() {
        let mut lanes = LaneSet::new();
        lanes.put(b"k", b"tx");
        lanes.flush();
        lanes.switch_to(Lane::Check);
        assert_eq!(lanes.lookup(b"k"), None);
    }

    #[test]
    fn tombstones_shadow_the_base() {
        let mut lanes = LaneSet::new();
        lanes.del(b"k");
        lanes.flush();
        assert_eq!(lanes.lookup(b"k"), Some(None));
    }

    #[test]
    fn take_committable_reopens_all_lanes() {
        let mut lanes = LaneSet::new();
        lanes.put(b"k", b"v");
        lanes.flush();
        let committable = lanes.take_committable();
        assert_eq!(committable.len(), 1);
        assert_eq!(lanes.lookup(b"k"), None);
    }
}
