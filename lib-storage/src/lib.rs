//! Transactional Key-Value Storage with Isolation Lanes
//!
//! One durable key space, three isolated transactional views ("lanes"):
//!
//! - **Transaction** — accumulates state across an entire block; the only
//!   lane that is ever committed.
//! - **Check** — speculative validation; rebuilt fresh per check, always
//!   discarded.
//! - **Query** — read-only queries; rebuilt fresh per query, always
//!   discarded.
//!
//! # Invariants
//!
//! 1. The active lane is selected explicitly via `switch_to`, never
//!    inferred. A single external call writes to exactly one lane.
//! 2. Writes are invisible to reads until `flush` promotes them; `reset`
//!    discards unflushed writes, so a failing call leaves its lane exactly
//!    as it found it.
//! 3. `commit_block` persists the Transaction lane atomically and reopens
//!    fresh lanes over the new durable base.
//! 4. Protected keys bypass lanes entirely: they are read/written directly
//!    against durable storage and survive every reset.
//!
//! Absence of a key is a normal result, not an error. Durable-engine
//! open/commit failure is fatal and not retried.

mod error;
mod lane;
mod mem_store;
mod sled_store;

pub use error::{StorageError, StorageResult};
pub use lane::Lane;
pub use mem_store::MemStorage;
pub use sled_store::SledStorage;

/// The storage engine surface consumed by the execution layer.
///
/// Methods take `&self`: implementations carry interior mutability so the
/// engine can be shared between the execution context and the lifecycle
/// manager.
pub trait Storage: Send + Sync {
    /// Select the lane that subsequent `put`/`get`/`del` act on.
    fn switch_to(&self, lane: Lane);

    /// Stage a write into the active lane. Invisible to reads until
    /// `flush`.
    fn put(&self, key: &[u8], val: &[u8]) -> StorageResult<()>;

    /// Read through the active lane's flushed overlay, falling back to the
    /// durable base.
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Stage a deletion into the active lane.
    fn del(&self, key: &[u8]) -> StorageResult<()>;

    /// Promote the active lane's staged writes so later reads in the same
    /// call observe them. Does not cross the durability boundary.
    fn flush(&self) -> StorageResult<()>;

    /// Discard the active lane's staged writes. For the Check and Query
    /// lanes this also discards flushed writes: those lanes are rebuilt
    /// fresh for every call.
    fn reset(&self);

    /// Durably persist everything flushed into the Transaction lane since
    /// the previous commit, then reopen fresh lanes over the new base.
    fn commit_block(&self) -> StorageResult<()>;

    /// Write a lane-exempt metadata key directly to durable storage.
    fn save_protected_key(&self, key: &str, val: &[u8]) -> StorageResult<()>;

    /// Read a lane-exempt metadata key directly from durable storage.
    fn get_protected_key(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;
}
