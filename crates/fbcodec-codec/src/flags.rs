//! The header flag byte and the compression modes it encodes.
//!
//! On the wire the flag byte is a [`ByteFlags`] with these bit indices:
//!
//! | Index | Name         | Meaning                                   |
//! |-------|--------------|-------------------------------------------|
//! | 0     | `rle8`       | 8-bit run lengths (with 1: 7/15-bit)      |
//! | 1     | `rle16`      | 16-bit run lengths (with 0: 7/15-bit)     |
//! | 2     | `opaque`     | colors stored as RGB                      |
//! | 3     | `indexed`    | colors stored as palette indices          |
//! | 4     | `changeOnly` | delta frames with skip counts (sequences) |
//! | 5     | `co16`       | 16-bit skip counts                        |
//! | 6     | `co15`       | 7/15-bit skip counts                      |
//! | 7     | `indexed15`  | 7/15-bit palette indices                  |
//!
//! Everything past the read is the decoded [`FormatFlags`]; the shared
//! rle8/rle16 bit pair never leaks out of this module.

use std::fmt;

use fbcodec_primitives::ByteFlags;
use serde::{Deserialize, Serialize};

use crate::counter::Counter;
use crate::error::{CodecError, Result};

const BIT_RLE8: usize = 0;
const BIT_RLE16: usize = 1;
const BIT_OPAQUE: usize = 2;
const BIT_INDEXED: usize = 3;
const BIT_CHANGE_ONLY: usize = 4;
const BIT_CO16: usize = 5;
const BIT_CO15: usize = 6;
const BIT_INDEXED15: usize = 7;

/// Diagnostic names of the flag bits, by bit index.
pub const FLAG_NAMES: [&str; 8] = [
    "rle8",
    "rle16",
    "opaque",
    "indexed",
    "changeOnly",
    "co16",
    "co15",
    "indexed15",
];

/// Run-length counter width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RleMode {
    #[default]
    None,
    Rle8,
    Rle16,
    Rle15,
}

impl RleMode {
    pub(crate) fn counter(self) -> Option<Counter> {
        match self {
            RleMode::None => None,
            RleMode::Rle8 => Some(Counter::U8),
            RleMode::Rle16 => Some(Counter::U16),
            RleMode::Rle15 => Some(Counter::Var15),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RleMode::None => "none",
            RleMode::Rle8 => "rle8",
            RleMode::Rle16 => "rle16",
            RleMode::Rle15 => "rle15",
        }
    }
}

/// How colors are stored in the pixel stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexMode {
    /// Colors written in full.
    #[default]
    Direct,
    /// One-byte palette indices.
    Index8,
    /// 7/15-bit palette indices.
    Index15,
}

impl IndexMode {
    /// Largest palette the mode can address.
    pub fn capacity(self) -> usize {
        match self {
            IndexMode::Direct => 0,
            IndexMode::Index8 => 256,
            IndexMode::Index15 => crate::palette::Palette::MAX_LEN,
        }
    }

    /// Narrowest index mode that can address `len` palette entries.
    pub fn for_palette_len(len: usize) -> Option<IndexMode> {
        if len <= IndexMode::Index8.capacity() {
            Some(IndexMode::Index8)
        } else if len <= IndexMode::Index15.capacity() {
            Some(IndexMode::Index15)
        } else {
            None
        }
    }
}

/// Skip-count width for `changeOnly` delta frames.
///
/// Every width chains: a count of the maximum value means "that many,
/// and keep reading".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipMode {
    #[default]
    Co8,
    Co16,
    Co15,
}

impl SkipMode {
    pub(crate) fn counter(self) -> Counter {
        match self {
            SkipMode::Co8 => Counter::U8,
            SkipMode::Co16 => Counter::U16,
            SkipMode::Co15 => Counter::Var15,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SkipMode::Co8 => "co8",
            SkipMode::Co16 => "co16",
            SkipMode::Co15 => "co15",
        }
    }
}

/// The decoded flag byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FormatFlags {
    pub rle: RleMode,
    pub opaque: bool,
    pub index: IndexMode,
    pub change_only: Option<SkipMode>,
}

impl FormatFlags {
    pub fn to_byte_flags(self) -> ByteFlags {
        let (rle8, rle16) = match self.rle {
            RleMode::None => (false, false),
            RleMode::Rle8 => (true, false),
            RleMode::Rle16 => (false, true),
            RleMode::Rle15 => (true, true),
        };
        ByteFlags::new()
            .with(BIT_RLE8, rle8)
            .with(BIT_RLE16, rle16)
            .with(BIT_OPAQUE, self.opaque)
            .with(BIT_INDEXED, self.index != IndexMode::Direct)
            .with(BIT_CHANGE_ONLY, self.change_only.is_some())
            .with(BIT_CO16, self.change_only == Some(SkipMode::Co16))
            .with(BIT_CO15, self.change_only == Some(SkipMode::Co15))
            .with(BIT_INDEXED15, self.index == IndexMode::Index15)
    }

    pub fn from_byte_flags(flags: ByteFlags) -> Result<Self> {
        let rle = match (flags.get(BIT_RLE8), flags.get(BIT_RLE16)) {
            (false, false) => RleMode::None,
            (true, false) => RleMode::Rle8,
            (false, true) => RleMode::Rle16,
            (true, true) => RleMode::Rle15,
        };

        let index = match (flags.get(BIT_INDEXED), flags.get(BIT_INDEXED15)) {
            (false, false) => IndexMode::Direct,
            (true, false) => IndexMode::Index8,
            (true, true) => IndexMode::Index15,
            (false, true) => {
                return Err(CodecError::InvalidFlags {
                    bits: flags.bits(),
                    reason: "indexed15 without indexed",
                })
            }
        };

        let skip = match (flags.get(BIT_CO16), flags.get(BIT_CO15)) {
            (false, false) => SkipMode::Co8,
            (true, false) => SkipMode::Co16,
            (false, true) => SkipMode::Co15,
            (true, true) => {
                return Err(CodecError::InvalidFlags {
                    bits: flags.bits(),
                    reason: "co16 and co15 both set",
                })
            }
        };

        Ok(Self {
            rle,
            opaque: flags.get(BIT_OPAQUE),
            index,
            change_only: flags.get(BIT_CHANGE_ONLY).then_some(skip),
        })
    }

    /// True when any sequence-only bit is set.
    pub(crate) fn has_sequence_bits(flags: ByteFlags) -> bool {
        flags.get(BIT_CHANGE_ONLY) || flags.get(BIT_CO16) || flags.get(BIT_CO15)
    }

    /// Names of the set flag bits.
    pub fn names(self) -> Vec<&'static str> {
        self.to_byte_flags().set_names(&FLAG_NAMES)
    }
}

impl fmt::Display for FormatFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&names.join(","))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rle15_is_both_rle_bits() {
        let flags = FormatFlags {
            rle: RleMode::Rle15,
            ..FormatFlags::default()
        };
        assert_eq!(flags.to_byte_flags().bits(), 0xC0);
        let decoded = FormatFlags::from_byte_flags(ByteFlags::from_bits(0xC0)).unwrap();
        assert_eq!(decoded.rle, RleMode::Rle15);
    }

    #[test]
    fn bit_layout() {
        let flags = FormatFlags {
            rle: RleMode::Rle8,
            opaque: true,
            index: IndexMode::Index15,
            change_only: Some(SkipMode::Co15),
        };
        assert_eq!(flags.to_byte_flags().bits(), 0b1011_1011);
        assert_eq!(
            FormatFlags::from_byte_flags(flags.to_byte_flags()).unwrap(),
            flags
        );
    }

    #[test]
    fn skip_bits_without_change_only_are_ignored() {
        let decoded = FormatFlags::from_byte_flags(ByteFlags::from_bits(0x04)).unwrap();
        assert_eq!(decoded.change_only, None);
    }

    #[test]
    fn rejects_indexed15_alone() {
        let err = FormatFlags::from_byte_flags(ByteFlags::from_bits(0x01)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFlags { bits: 0x01, .. }));
    }

    #[test]
    fn rejects_both_skip_widths() {
        let err = FormatFlags::from_byte_flags(ByteFlags::from_bits(0x0E)).unwrap_err();
        assert!(matches!(err, CodecError::InvalidFlags { .. }));
    }

    #[test]
    fn index_mode_for_palette_len() {
        assert_eq!(IndexMode::for_palette_len(256), Some(IndexMode::Index8));
        assert_eq!(IndexMode::for_palette_len(257), Some(IndexMode::Index15));
        assert_eq!(IndexMode::for_palette_len(32767), Some(IndexMode::Index15));
        assert_eq!(IndexMode::for_palette_len(32768), None);
    }

    #[test]
    fn display_lists_names() {
        let flags = FormatFlags {
            rle: RleMode::Rle16,
            opaque: true,
            ..FormatFlags::default()
        };
        assert_eq!(flags.to_string(), "rle16,opaque");
        assert_eq!(FormatFlags::default().to_string(), "none");
    }
}
