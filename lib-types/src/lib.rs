//! Canonical Primitive Types
//!
//! Rule: no String identifiers in consensus state. Ever.
//!
//! These newtypes are the foundational building blocks for all
//! consensus-critical data structures. They are fixed-size, cheap to copy
//! and compare, and carry their canonical codec impls next to their
//! definitions so writer and reader can never drift.

mod primitives;

pub use primitives::{
    Address, BlockHeight, SignatureBytes, TxHash, VerifyKey, ADDRESS_LEN, SIGNATURE_LEN,
    TX_HASH_LEN, VERIFY_KEY_LEN,
};
