//! Variable-length integer encoding: 7 payload bits per byte, high bit set
//! on every byte except the last.

use crate::buffer::Buffer;
use crate::error::{CodecError, CodecResult};

/// Maximum encoded length of a u64 varint (ceil(64 / 7)).
const MAX_VARINT_LEN: usize = 10;

/// Append `value` to `buf` in varint form.
pub fn encode_varint(buf: &mut Buffer, mut value: u64) {
    loop {
        let low = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            buf.write_bytes(&[low | 0x80]);
        } else {
            buf.write_bytes(&[low]);
            break;
        }
    }
}

/// Read a varint from `buf`. Fails if the buffer ends mid-sequence or the
/// value does not fit in 64 bits.
pub fn decode_varint(buf: &mut Buffer) -> CodecResult<u64> {
    let mut value = 0u64;
    for idx in 0..MAX_VARINT_LEN {
        let byte = match buf.read_byte() {
            Ok(b) => b,
            Err(_) => return Err(CodecError::InvalidVarint),
        };
        let payload = u64::from(byte & 0x7f);
        // The tenth byte may only carry the final bit of a u64.
        if idx == MAX_VARINT_LEN - 1 && payload > 1 {
            return Err(CodecError::InvalidVarint);
        }
        value |= payload << (7 * idx);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(CodecError::InvalidVarint)
}
