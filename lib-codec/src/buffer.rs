//! Byte buffer with a monotonic read cursor.

use crate::error::{CodecError, CodecResult};

/// Mutable byte cursor used for both encoding and decoding.
///
/// Writes append to the end; reads advance a cursor that never rewinds.
/// Reading past the available bytes fails with [`CodecError::UnexpectedEnd`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    data: Vec<u8>,
    pos: usize,
}

impl Buffer {
    /// Create an empty buffer (typical for encoding).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer over existing bytes (typical for decoding).
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
        }
    }

    /// Append raw bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.data.extend_from_slice(bytes);
    }

    /// Consume exactly `len` bytes, advancing the cursor.
    pub fn read_bytes(&mut self, len: usize) -> CodecResult<&[u8]> {
        let available = self.data.len() - self.pos;
        if len > available {
            return Err(CodecError::UnexpectedEnd {
                needed: len,
                available,
            });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Consume a single byte.
    pub fn read_byte(&mut self) -> CodecResult<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    /// Bytes not yet consumed, without advancing the cursor.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Number of unconsumed bytes.
    pub fn remaining_len(&self) -> usize {
        self.data.len() - self.pos
    }

    /// True when every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    /// The full written contents, independent of the read cursor.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Take ownership of the written contents.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_advances_and_never_rewinds() {
        let mut buf = Buffer::from_bytes(vec![1, 2, 3, 4]);
        assert_eq!(buf.read_bytes(2).unwrap(), &[1, 2]);
        assert_eq!(buf.remaining(), &[3, 4]);
        assert_eq!(buf.read_bytes(2).unwrap(), &[3, 4]);
        assert!(buf.is_exhausted());
    }

    #[test]
    fn read_past_end_fails() {
        let mut buf = Buffer::from_bytes(vec![1, 2]);
        let err = buf.read_bytes(3).unwrap_err();
        assert_eq!(
            err,
            CodecError::UnexpectedEnd {
                needed: 3,
                available: 2
            }
        );
        // A failed read must not consume anything.
        assert_eq!(buf.remaining_len(), 2);
    }

    #[test]
    fn writes_append() {
        let mut buf = Buffer::new();
        buf.write_bytes(&[0xaa]);
        buf.write_bytes(&[0xbb, 0xcc]);
        assert_eq!(buf.as_bytes(), &[0xaa, 0xbb, 0xcc]);
    }
}
