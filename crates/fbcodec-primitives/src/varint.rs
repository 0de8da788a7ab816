//! The 7/15-bit variable width integer.
//!
//! ```text
//! 0xxxxxxx                 value 0x00..=0x7F
//! 1xxxxxxx xxxxxxxx        value 0x80..=0x7FFF (continuation bit set)
//! ```

use std::fmt;

use bytes::BufMut;

use crate::error::{PrimitiveError, Result};
use crate::value::{take, BinaryValue};

/// Continuation bit in the first byte of a two-byte encoding.
const CONTINUATION: u8 = 0x80;

/// A value in `0..=0x7FFF`, encoded in one or two bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct VarU15(u16);

impl VarU15 {
    /// Largest value that fits in the single-byte form.
    pub const MAX_SHORT: u16 = 0x7F;

    /// Largest representable value.
    pub const MAX: u16 = 0x7FFF;

    /// Range-checked constructor.
    pub fn new(value: u16) -> Result<Self> {
        if value > Self::MAX {
            return Err(PrimitiveError::OutOfRange {
                kind: "uint7_15",
                value: i64::from(value),
                max: u64::from(Self::MAX),
            });
        }
        Ok(Self(value))
    }

    /// The wrapped value.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Encoded width of `value` without constructing it.
    pub const fn len_of(value: u16) -> usize {
        if value <= Self::MAX_SHORT {
            1
        } else {
            2
        }
    }
}

impl TryFrom<i64> for VarU15 {
    type Error = PrimitiveError;

    fn try_from(value: i64) -> Result<Self> {
        u16::try_from(value)
            .ok()
            .filter(|v| *v <= Self::MAX)
            .map(Self)
            .ok_or(PrimitiveError::OutOfRange {
                kind: "uint7_15",
                value,
                max: u64::from(Self::MAX),
            })
    }
}

impl From<VarU15> for u16 {
    fn from(value: VarU15) -> Self {
        value.0
    }
}

impl BinaryValue for VarU15 {
    fn encoded_len(&self) -> usize {
        Self::len_of(self.0)
    }

    fn encode<B: BufMut>(&self, dst: &mut B) {
        if self.0 <= Self::MAX_SHORT {
            dst.put_u8(self.0 as u8);
        } else {
            dst.put_u8(CONTINUATION | (self.0 >> 8) as u8);
            dst.put_u8(self.0 as u8);
        }
    }

    fn decode(src: &[u8], offset: usize) -> Result<(Self, usize)> {
        let first = take(src, offset, 1)?[0];
        if first & CONTINUATION == 0 {
            return Ok((Self(u16::from(first)), 1));
        }
        let second = take(src, offset + 1, 1)?[0];
        let value = (u16::from(first & !CONTINUATION) << 8) | u16::from(second);
        Ok((Self(value), 2))
    }
}

impl fmt::Display for VarU15 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 <= Self::MAX_SHORT {
            write!(f, "{:#04x}", self.0)
        } else {
            write!(f, "{:#06x}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_form_boundary() {
        assert_eq!(VarU15::new(0x7F).unwrap().to_bytes().as_ref(), &[0x7F]);
        assert_eq!(
            VarU15::new(0x80).unwrap().to_bytes().as_ref(),
            &[0x80, 0x80]
        );
    }

    #[test]
    fn long_form_sets_continuation_bit() {
        let bytes = VarU15::new(0x7FFF).unwrap().to_bytes();
        assert_eq!(bytes.as_ref(), &[0xFF, 0xFF]);
        let (value, used) = VarU15::decode(&bytes, 0).unwrap();
        assert_eq!((value.get(), used), (0x7FFF, 2));
    }

    #[test]
    fn decode_inspects_first_byte_only_for_width() {
        let src = [0x05, 0x81, 0x00];
        assert_eq!(VarU15::decode(&src, 0).unwrap(), (VarU15(5), 1));
        assert_eq!(VarU15::decode(&src, 1).unwrap(), (VarU15(0x100), 2));
    }

    #[test]
    fn rejects_values_above_fifteen_bits() {
        assert!(VarU15::new(0x8000).is_err());
        assert!(VarU15::try_from(-3i64).is_err());
        assert!(VarU15::try_from(0x8000i64).is_err());
        assert_eq!(VarU15::try_from(300i64).unwrap().get(), 300);
    }

    #[test]
    fn truncated_long_form() {
        let err = VarU15::decode(&[0x80], 0).unwrap_err();
        assert!(matches!(err, PrimitiveError::UnexpectedEof { offset: 1, .. }));
    }

    #[test]
    fn len_of_matches_encoding() {
        for value in [0u16, 1, 0x7F, 0x80, 0x1234, 0x7FFF] {
            let v = VarU15::new(value).unwrap();
            assert_eq!(VarU15::len_of(value), v.to_bytes().len());
        }
    }
}
