//! `Encode`/`Decode` impls for the primitive value set.

use alloy_primitives::U256;

use crate::buffer::Buffer;
use crate::error::{CodecError, CodecResult};

/// A value with a canonical byte encoding.
pub trait Encode {
    fn encode(&self, buf: &mut Buffer);

    /// Encode into a fresh byte vector.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut buf = Buffer::new();
        self.encode(&mut buf);
        buf.into_vec()
    }
}

/// A value decodable from its canonical byte encoding.
pub trait Decode: Sized {
    fn decode(buf: &mut Buffer) -> CodecResult<Self>;

    /// Decode from a standalone byte slice.
    fn decode_from_slice(bytes: &[u8]) -> CodecResult<Self> {
        let mut buf = Buffer::from_bytes(bytes);
        Self::decode(&mut buf)
    }
}

macro_rules! impl_le_int {
    ($($ty:ty),*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, buf: &mut Buffer) {
                    buf.write_bytes(&self.to_le_bytes());
                }
            }

            impl Decode for $ty {
                fn decode(buf: &mut Buffer) -> CodecResult<Self> {
                    let raw = buf.read_bytes(std::mem::size_of::<$ty>())?;
                    let mut bytes = [0u8; std::mem::size_of::<$ty>()];
                    bytes.copy_from_slice(raw);
                    Ok(<$ty>::from_le_bytes(bytes))
                }
            }
        )*
    };
}

impl_le_int!(u8, u16, u32, u64);

impl Encode for bool {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_bytes(&[u8::from(*self)]);
    }
}

impl Decode for bool {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        match buf.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }
}

// 256-bit integers travel as 32 bytes, big-endian (fixed-width big-integer
// form, distinct from the little-endian machine-word rule above).
impl Encode for U256 {
    fn encode(&self, buf: &mut Buffer) {
        buf.write_bytes(&self.to_be_bytes::<32>());
    }
}

impl Decode for U256 {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let raw = buf.read_bytes(32)?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(raw);
        Ok(U256::from_be_bytes(bytes))
    }
}

impl Encode for String {
    fn encode(&self, buf: &mut Buffer) {
        (self.len() as u64).encode(buf);
        buf.write_bytes(self.as_bytes());
    }
}

impl Decode for String {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let len = u64::decode(buf)? as usize;
        let raw = buf.read_bytes(len)?;
        // Lossy conversion would silently change bytes; reject instead.
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, buf: &mut Buffer) {
        (self.len() as u64).encode(buf);
        for item in self {
            item.encode(buf);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let count = u64::decode(buf)? as usize;
        // Guard against absurd counts in truncated/garbage input: we can
        // never hold more elements than remaining bytes.
        if count > buf.remaining_len() && std::mem::size_of::<T>() > 0 {
            return Err(CodecError::UnexpectedEnd {
                needed: count,
                available: buf.remaining_len(),
            });
        }
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(T::decode(buf)?);
        }
        Ok(out)
    }
}

impl<A: Encode, B: Encode> Encode for (A, B) {
    fn encode(&self, buf: &mut Buffer) {
        self.0.encode(buf);
        self.1.encode(buf);
    }
}

impl<A: Decode, B: Decode> Decode for (A, B) {
    fn decode(buf: &mut Buffer) -> CodecResult<Self> {
        let a = A::decode(buf)?;
        let b = B::decode(buf)?;
        Ok((a, b))
    }
}
