//! Chain Execution Errors
//!
//! Four failure classes with distinct blast radii:
//!
//! - [`lib_codec::CodecError`] (parse): recoverable, rejects the enclosing
//!   transaction or query.
//! - [`DomainError`]: contract-logic failure; aborts and resets the
//!   enclosing call only.
//! - [`ConfigError`]: programmer error at wiring time or a lifecycle call
//!   outside its valid state; fatal.
//! - [`lib_storage::StorageError`]: durable engine failure; fatal, never
//!   retried.

use lib_codec::{CodecError, U256};
use lib_storage::StorageError;
use lib_types::Address;
use thiserror::Error;

/// Wiring/lifecycle misuse. These indicate a bug in the embedding, not bad
/// input, and are never triggered by wire data.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("primary listener already registered")]
    PrimaryAlreadySet,

    #[error("primary-capable listener registered into the observer slot")]
    ObserverIsPrimary,

    #[error("{op} called in lifecycle state {state}")]
    InvalidLifecycleState {
        op: &'static str,
        state: &'static str,
    },

    #[error("{0} called without a primary listener")]
    MissingPrimary(&'static str),

    #[error("chain already initialized")]
    AlreadyInitialized,

    #[error("duplicate message id {id} in {kind} dispatch table")]
    DuplicateMessageId { kind: &'static str, id: u16 },

    #[error("call provenance not set")]
    MissingProvenance,
}

/// Contract-logic failures. Reported to the caller; other transactions and
/// the enclosing block are unaffected.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("insufficient balance of {token} at {account}: have {have}, need {need}")]
    InsufficientBalance {
        account: Address,
        token: Address,
        have: U256,
        need: U256,
    },

    #[error("no contract at {0}")]
    ContractNotFound(Address),

    #[error("contract at {address} is a {actual}, expected {expected}")]
    KindMismatch {
        address: Address,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("address already in use: {0}")]
    DuplicateAddress(Address),

    #[error("unknown contract kind {0}")]
    UnknownContractKind(u16),

    #[error("unknown message id {id} for {kind} contract")]
    UnknownMessage { kind: &'static str, id: u16 },

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid nonce: expected {expected}, got {actual}")]
    InvalidNonce { expected: u64, actual: u64 },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("arithmetic overflow")]
    Overflow,

    #[error("token supply underflow")]
    SupplyUnderflow,
}

/// Top-level error for everything crossing the chain layer's boundary.
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("parse error: {0}")]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for chain operations.
pub type ChainResult<T> = Result<T, ChainError>;
