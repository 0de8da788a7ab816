use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{PrimitiveError, Result};

/// A value with a self-describing binary encoding.
///
/// `decode` must accept exactly what `encode` produced and report the
/// number of bytes it consumed, which always equals `encoded_len` of the
/// decoded value.
pub trait BinaryValue: Sized {
    /// Number of bytes [`BinaryValue::encode`] writes for this value.
    fn encoded_len(&self) -> usize;

    /// Append the encoded value to `dst`.
    fn encode<B: BufMut>(&self, dst: &mut B);

    /// Decode a value starting at `offset`, returning it with its byte length.
    fn decode(src: &[u8], offset: usize) -> Result<(Self, usize)>;

    /// Encode into a fresh buffer.
    fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }
}

/// Borrow `needed` bytes at `offset`, or fail with [`PrimitiveError::UnexpectedEof`].
pub fn take(src: &[u8], offset: usize, needed: usize) -> Result<&[u8]> {
    let available = src.len().saturating_sub(offset);
    if available < needed {
        return Err(PrimitiveError::UnexpectedEof {
            offset,
            needed,
            available,
        });
    }
    Ok(&src[offset..offset + needed])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_within_bounds() {
        let src = [1, 2, 3, 4];
        assert_eq!(take(&src, 1, 2).unwrap(), &[2, 3]);
        assert_eq!(take(&src, 4, 0).unwrap(), &[] as &[u8]);
    }

    #[test]
    fn take_past_end() {
        let src = [1, 2, 3];
        let err = take(&src, 2, 2).unwrap_err();
        assert_eq!(
            err,
            PrimitiveError::UnexpectedEof {
                offset: 2,
                needed: 2,
                available: 1
            }
        );
    }

    #[test]
    fn take_offset_beyond_buffer() {
        let err = take(&[0u8; 2], 10, 1).unwrap_err();
        assert!(matches!(
            err,
            PrimitiveError::UnexpectedEof { available: 0, .. }
        ));
    }
}
