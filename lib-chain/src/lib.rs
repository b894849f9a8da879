//! Deterministic contract execution under an external consensus engine.
//!
//! Consensus decides transaction order; this crate decides what each
//! transaction means. The pieces, bottom up:
//!
//! - [`keys`]: fixed-width key encoding for contract state.
//! - [`contracts`]: the closed set of contract variants (Account, Token,
//!   Creator) and the bonding [`contracts::Curve`].
//! - [`dispatch`]: per-kind message tables mapping numeric ids to
//!   handlers.
//! - [`context`]: the execution engine holding live contracts and call
//!   provenance.
//! - [`listener`]: the block lifecycle (primary listener, observers,
//!   manager).
//! - [`node`]: the embedding surface, including read-only queries.
//!
//! Execution is single-threaded by construction: consensus delivers one
//! lifecycle call at a time.

pub mod context;
pub mod contracts;
pub mod dispatch;
pub mod error;
pub mod keys;
pub mod listener;
pub mod node;

pub use context::{ExecutionContext, Provenance};
pub use error::{ChainError, ChainResult, ConfigError, DomainError};
pub use listener::manager::LifecycleManager;
pub use listener::primary::ChainPrimary;
pub use node::ChainNode;
