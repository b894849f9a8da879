use thiserror::Error;

/// Parse/decode failures. All recoverable: a malformed buffer rejects the
/// enclosing transaction or query, never corrupts state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer underrun: needed {needed} bytes, {available} available")]
    UnexpectedEnd { needed: usize, available: usize },

    #[error("varint ended mid-sequence or exceeds 64 bits")]
    InvalidVarint,

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    #[error("unknown discriminant {value} for {type_name}")]
    UnknownDiscriminant {
        type_name: &'static str,
        value: u64,
    },
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
