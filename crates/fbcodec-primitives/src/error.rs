/// Errors raised while constructing, encoding or decoding primitive values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrimitiveError {
    /// A value does not fit the declared range of its type.
    #[error("{kind} value {value} out of range (max {max})")]
    OutOfRange {
        kind: &'static str,
        value: i64,
        max: u64,
    },

    /// A string contains a character outside 7-bit ASCII.
    #[error("non-ASCII character {code:#x} at position {position}")]
    NonAscii { position: usize, code: u32 },

    /// A NUL-terminated string contains an interior NUL.
    #[error("interior NUL at position {position} in NUL-terminated string")]
    InteriorNul { position: usize },

    /// A read would run past the end of the supplied buffer.
    #[error("unexpected end of buffer at offset {offset} (need {needed} bytes, {available} available)")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A NUL-terminated string has no terminator before the end of the buffer.
    #[error("unterminated string starting at offset {offset}")]
    Unterminated { offset: usize },
}

pub type Result<T> = std::result::Result<T, PrimitiveError>;
