//! ASCII strings with a fixed or NUL-terminated layout.

use std::fmt;

use bytes::BufMut;

use crate::error::{PrimitiveError, Result};
use crate::value::take;

/// How an [`AsciiString`] is laid out on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringLayout {
    /// Exactly this many bytes, no terminator.
    Fixed(usize),
    /// The characters followed by a single `0x00`.
    NullTerminated,
}

/// A 7-bit ASCII string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AsciiString {
    text: String,
    layout: StringLayout,
}

impl AsciiString {
    /// A string encoded as exactly its own characters.
    pub fn fixed(text: &str) -> Result<Self> {
        check_ascii(text.bytes())?;
        Ok(Self {
            text: text.to_string(),
            layout: StringLayout::Fixed(text.len()),
        })
    }

    /// A string encoded with a trailing NUL.
    pub fn null_terminated(text: &str) -> Result<Self> {
        check_ascii(text.bytes())?;
        if let Some(position) = text.bytes().position(|b| b == 0) {
            return Err(PrimitiveError::InteriorNul { position });
        }
        Ok(Self {
            text: text.to_string(),
            layout: StringLayout::NullTerminated,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn layout(&self) -> StringLayout {
        self.layout
    }

    /// Number of bytes [`AsciiString::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        match self.layout {
            StringLayout::Fixed(len) => len,
            StringLayout::NullTerminated => self.text.len() + 1,
        }
    }

    pub fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_slice(self.text.as_bytes());
        if self.layout == StringLayout::NullTerminated {
            dst.put_u8(0);
        }
    }

    /// Decode a string of the given layout at `offset`.
    ///
    /// Returns the string and the number of bytes consumed, including the
    /// terminator for [`StringLayout::NullTerminated`].
    pub fn decode(src: &[u8], offset: usize, layout: StringLayout) -> Result<(Self, usize)> {
        match layout {
            StringLayout::Fixed(len) => {
                let raw = take(src, offset, len)?;
                Ok((Self::from_raw(raw, layout)?, len))
            }
            StringLayout::NullTerminated => {
                let rest = src
                    .get(offset..)
                    .ok_or(PrimitiveError::Unterminated { offset })?;
                let end = rest
                    .iter()
                    .position(|b| *b == 0)
                    .ok_or(PrimitiveError::Unterminated { offset })?;
                Ok((Self::from_raw(&rest[..end], layout)?, end + 1))
            }
        }
    }

    fn from_raw(raw: &[u8], layout: StringLayout) -> Result<Self> {
        check_ascii(raw.iter().copied())?;
        Ok(Self {
            text: raw.iter().map(|b| char::from(*b)).collect(),
            layout,
        })
    }
}

impl fmt::Display for AsciiString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn check_ascii(bytes: impl Iterator<Item = u8>) -> Result<()> {
    for (position, b) in bytes.enumerate() {
        if b > 0x7F {
            return Err(PrimitiveError::NonAscii {
                position,
                code: u32::from(b),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;

    fn encoded(s: &AsciiString) -> Vec<u8> {
        let mut buf = BytesMut::new();
        s.encode(&mut buf);
        buf.to_vec()
    }

    #[test]
    fn fixed_layout_has_no_terminator() {
        let tag = AsciiString::fixed("fbb ").unwrap();
        assert_eq!(encoded(&tag), b"fbb ");
        assert_eq!(tag.encoded_len(), 4);
    }

    #[test]
    fn terminated_layout_appends_nul() {
        let tag = AsciiString::null_terminated("fbs").unwrap();
        assert_eq!(encoded(&tag), b"fbs\0");
        assert_eq!(tag.encoded_len(), 4);
    }

    #[test]
    fn decode_terminated_reports_consumed_bytes() {
        let (tag, used) =
            AsciiString::decode(b"abc\0rest", 0, StringLayout::NullTerminated).unwrap();
        assert_eq!(tag.as_str(), "abc");
        assert_eq!(used, 4);
    }

    #[test]
    fn decode_fixed_at_offset() {
        let (tag, used) = AsciiString::decode(b"xxfbb ", 2, StringLayout::Fixed(4)).unwrap();
        assert_eq!(tag.as_str(), "fbb ");
        assert_eq!(used, 4);
    }

    #[test]
    fn rejects_non_ascii() {
        let err = AsciiString::fixed("caf\u{e9}").unwrap_err();
        assert!(matches!(err, PrimitiveError::NonAscii { position: 3, .. }));

        let err = AsciiString::decode(&[b'a', 0xC3, 0], 0, StringLayout::NullTerminated)
            .unwrap_err();
        assert!(matches!(err, PrimitiveError::NonAscii { position: 1, code: 0xC3 }));
    }

    #[test]
    fn rejects_interior_nul() {
        assert!(matches!(
            AsciiString::null_terminated("a\0b"),
            Err(PrimitiveError::InteriorNul { position: 1 })
        ));
    }

    #[test]
    fn missing_terminator() {
        let err = AsciiString::decode(b"fbs", 0, StringLayout::NullTerminated).unwrap_err();
        assert_eq!(err, PrimitiveError::Unterminated { offset: 0 });
    }
}
