//! Canonical Binary Codec
//!
//! Every value that crosses the wire or lands in storage has exactly one
//! byte-level encoding, and decode(encode(v)) == v bit for bit. There is no
//! schema versioning: a value's type is implied entirely by the call site
//! reading it, so writer and reader must agree on encode/decode order.
//!
//! # Encoding Rules
//!
//! - Fixed-width integers (u8/u16/u32/u64): little-endian
//! - 256-bit integers: 32 bytes, big-endian
//! - Booleans: one byte, strictly 0 or 1
//! - Strings and byte sequences: u64 length prefix + raw bytes
//! - Ordered sequences: u64 count + encoded elements
//! - Pairs: first member's encoding followed by the second's
//! - Varint: 7 payload bits per byte, high bit = continuation (used only
//!   where compactness matters, never for consensus state)
//!
//! Reading past the remaining buffer length is a hard failure, never a
//! silent truncation.

mod buffer;
mod encode;
mod error;
mod varint;

pub use buffer::Buffer;
pub use encode::{Decode, Encode};
pub use error::{CodecError, CodecResult};
pub use varint::{decode_varint, encode_varint};

// Re-exported so downstream crates share one U256 definition.
pub use alloy_primitives::U256;
