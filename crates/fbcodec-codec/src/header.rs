//! Container header shared by the single-frame and sequence formats.
//!
//! ```text
//! ┌──────────┬───────────┬───────┬────────┬───────┬─────────────┬──────────────────┐
//! │ Tag (4B) │ Data ptr  │ Width │ Height │ Flags │ Padding (3B)│ Header entries … │
//! │ "fbb "   │ (4B)      │ (2B)  │ (2B)   │ (1B)  │ seq: count  │ type 0 ends      │
//! │ "fbs\0"  │           │       │        │       │ in last 2B  │                  │
//! └──────────┴───────────┴───────┴────────┴───────┴─────────────┴──────────────────┘
//! ```
//!
//! Header entries are `type:u16 | length:u16 | payload`. The palette
//! entry's length counts color records; every other type counts bytes.

use std::collections::HashSet;

use fbcodec_primitives::{AsciiString, ByteFlags, PrimitiveError, StringLayout};
use serde::Serialize;
use tracing::warn;

use crate::error::{CodecError, Result};
use crate::flags::{FormatFlags, IndexMode};
use crate::palette::Palette;
use crate::pixels::PixelFormat;
use crate::reader::ByteReader;
use crate::writer::ByteWriter;

/// Tag of a single-frame buffer.
pub const SINGLE_TAG: &str = "fbb ";

/// Tag of a frame sequence (NUL-terminated on the wire).
pub const SEQUENCE_TAG: &str = "fbs";

/// Bytes from the start of the tag to the first header entry.
pub const HEADER_SIZE: usize = 16;

/// Frame count declaring an open-ended stream.
pub const STREAM_FRAME_COUNT: u16 = 0xFFFF;

/// Header-table terminator.
pub const ENTRY_END: u16 = 0x0000;

/// Header-table palette entry.
pub const ENTRY_PALETTE: u16 = 0x0001;

const DATA_POINTER_OFFSET: usize = 4;

/// Which format a buffer holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerKind {
    Single,
    Sequence,
}

impl ContainerKind {
    fn tag_text(self) -> &'static str {
        match self {
            ContainerKind::Single => SINGLE_TAG,
            ContainerKind::Sequence => SEQUENCE_TAG,
        }
    }

    fn layout(self) -> StringLayout {
        match self {
            ContainerKind::Single => StringLayout::Fixed(SINGLE_TAG.len()),
            ContainerKind::Sequence => StringLayout::NullTerminated,
        }
    }

    fn tag(self) -> Result<AsciiString> {
        let tag = match self {
            ContainerKind::Single => AsciiString::fixed(SINGLE_TAG)?,
            ContainerKind::Sequence => AsciiString::null_terminated(SEQUENCE_TAG)?,
        };
        Ok(tag)
    }
}

/// Identify the container format from its first bytes.
pub fn sniff(bytes: &[u8]) -> Option<ContainerKind> {
    if bytes.starts_with(SINGLE_TAG.as_bytes()) {
        Some(ContainerKind::Single)
    } else if bytes.starts_with(b"fbs\0") {
        Some(ContainerKind::Sequence)
    } else {
        None
    }
}

/// Header fields an encoder writes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub kind: ContainerKind,
    pub width: u16,
    pub height: u16,
    pub flags: FormatFlags,
    /// Only written for sequences.
    pub frame_count: u16,
}

/// Write the fixed header, the header table and the data pointer.
///
/// On return the writer sits at the start of the data section.
pub(crate) fn write_header(
    writer: &mut ByteWriter,
    header: &Header,
    format: &PixelFormat,
) -> Result<()> {
    let start = writer.position();
    writer.put_string(&header.kind.tag()?);
    writer.put_u32(0); // data pointer, patched below
    writer.put_u16(header.width);
    writer.put_u16(header.height);
    writer.put(&header.flags.to_byte_flags());
    match header.kind {
        ContainerKind::Single => writer.put_zeros(3),
        ContainerKind::Sequence => {
            writer.put_zeros(1);
            writer.put_u16(header.frame_count);
        }
    }

    write_table(writer, format);

    let data_pointer = writer.position() - start;
    writer.patch_u32(start + DATA_POINTER_OFFSET, to_u32(data_pointer, "data pointer")?);
    Ok(())
}

/// Write the header-table entries for `format` and the terminator.
pub(crate) fn write_table(writer: &mut ByteWriter, format: &PixelFormat) {
    if let Some(palette) = format.table_palette() {
        writer.put_u16(ENTRY_PALETTE);
        writer.put_u16(palette.len() as u16);
        palette.write_records(writer, format.flags.opaque);
    }
    writer.put_u16(ENTRY_END);
}

/// Header fields a decoder read.
#[derive(Debug, Clone)]
pub(crate) struct ParsedHeader {
    pub data_pointer: usize,
    pub width: usize,
    pub height: usize,
    pub flag_bits: ByteFlags,
    pub frame_count: Option<u16>,
    pub format: PixelFormat,
}

/// Read the fixed header and header table of a `kind` container.
pub(crate) fn read_header(reader: &mut ByteReader<'_>, kind: ContainerKind) -> Result<ParsedHeader> {
    read_tag(reader, kind)?;
    let data_pointer = reader.read_u32()? as usize;
    let width = usize::from(reader.read_u16()?);
    let height = usize::from(reader.read_u16()?);
    let mut flag_bits = reader.read::<ByteFlags>()?;

    let frame_count = match kind {
        ContainerKind::Single => {
            reader.skip(3)?;
            if FormatFlags::has_sequence_bits(flag_bits) {
                warn!(
                    flags = %flag_bits,
                    "ignoring sequence-only flags in a single-frame header"
                );
                flag_bits = ByteFlags::from_bits(flag_bits.bits() & 0xF1);
            }
            None
        }
        ContainerKind::Sequence => {
            reader.skip(1)?;
            Some(reader.read_u16()?)
        }
    };

    let flags = FormatFlags::from_byte_flags(flag_bits)?;
    let palette = read_table(reader, flags.opaque)?;
    let format = PixelFormat::new(flags, palette)?;

    Ok(ParsedHeader {
        data_pointer,
        width,
        height,
        flag_bits,
        frame_count,
        format,
    })
}

fn read_tag(reader: &mut ByteReader<'_>, kind: ContainerKind) -> Result<()> {
    let expected = kind.tag_text();
    let start = reader.position();
    match reader.read_string(kind.layout()) {
        Ok(tag) if tag.as_str() == expected => Ok(()),
        Ok(tag) => Err(CodecError::InvalidTag {
            expected,
            found: tag.as_str().to_string(),
        }),
        Err(CodecError::Primitive(
            PrimitiveError::NonAscii { .. } | PrimitiveError::Unterminated { .. },
        )) => {
            reader.seek(start);
            Err(CodecError::InvalidTag {
                expected,
                found: "<not ascii>".to_string(),
            })
        }
        Err(err) => Err(err),
    }
}

/// Read header-table entries up to and including the terminator.
///
/// Returns the palette if the table defines one.
pub(crate) fn read_table(reader: &mut ByteReader<'_>, opaque: bool) -> Result<Option<Palette>> {
    let mut seen = HashSet::new();
    let mut palette = None;
    loop {
        let entry_type = reader.read_u16()?;
        if entry_type == ENTRY_END {
            return Ok(palette);
        }
        if !seen.insert(entry_type) {
            return Err(CodecError::DuplicateEntry(entry_type));
        }
        let length = usize::from(reader.read_u16()?);
        match entry_type {
            ENTRY_PALETTE => {
                palette = Some(Palette::read_records(reader, length, opaque)?);
            }
            other => {
                warn!(
                    entry_type = other,
                    length, "skipping unknown header entry"
                );
                reader.skip(length)?;
            }
        }
    }
}

pub(crate) fn to_u32(value: usize, what: &'static str) -> Result<u32> {
    u32::try_from(value).map_err(|_| CodecError::ValueOutOfRange {
        what,
        value: value as u64,
        max: u64::from(u32::MAX),
    })
}

/// Check that a frame's size fits the 16-bit header fields.
pub(crate) fn dimensions(width: usize, height: usize) -> Result<(u16, u16)> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(CodecError::Dimensions { width, height }),
    }
}

/// Header summary, read without decoding any pixels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderInfo {
    pub kind: ContainerKind,
    pub width: usize,
    pub height: usize,
    pub flag_bits: u8,
    pub flags: Vec<&'static str>,
    pub rle: &'static str,
    pub index: IndexMode,
    pub palette_len: Option<usize>,
    pub data_pointer: usize,
    /// Declared frame count (sequences only, `None` for open-ended streams).
    pub frame_count: Option<u16>,
    pub open_ended: bool,
    /// Records in the data section (sequences only).
    pub records_defined: Option<u16>,
    /// Bytes in the pixel stream (single frames only).
    pub data_length: Option<u32>,
}

/// Read the header of either container format.
pub fn inspect(bytes: &[u8]) -> Result<HeaderInfo> {
    let kind = sniff(bytes).ok_or_else(|| CodecError::InvalidTag {
        expected: "fbb |fbs",
        found: String::from_utf8_lossy(&bytes[..bytes.len().min(4)]).into_owned(),
    })?;

    let mut reader = ByteReader::new(bytes);
    let header = read_header(&mut reader, kind)?;
    reader.seek(header.data_pointer);

    let (records_defined, data_length) = match kind {
        ContainerKind::Single => (None, Some(reader.read_u32()?)),
        ContainerKind::Sequence => (Some(reader.read_u16()?), None),
    };
    let open_ended = header.frame_count == Some(STREAM_FRAME_COUNT);
    let flags = header.format.flags;

    Ok(HeaderInfo {
        kind,
        width: header.width,
        height: header.height,
        flag_bits: header.flag_bits.bits(),
        flags: flags.names(),
        rle: flags.rle.name(),
        index: flags.index,
        palette_len: header.format.palette.as_ref().map(Palette::len),
        data_pointer: header.data_pointer,
        frame_count: header.frame_count.filter(|_| !open_ended),
        open_ended,
        records_defined,
        data_length,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::RleMode;

    fn header(kind: ContainerKind, flags: FormatFlags) -> Header {
        Header {
            kind,
            width: 0x0102,
            height: 0x0304,
            flags,
            frame_count: 7,
        }
    }

    #[test]
    fn single_header_layout() {
        let mut writer = ByteWriter::new();
        let flags = FormatFlags {
            rle: RleMode::Rle8,
            ..FormatFlags::default()
        };
        let format = PixelFormat::new(flags, None).unwrap();
        write_header(&mut writer, &header(ContainerKind::Single, flags), &format).unwrap();
        assert_eq!(
            writer.as_slice(),
            &[
                b'f', b'b', b'b', b' ', // tag
                0, 0, 0, 18, // data pointer
                0x01, 0x02, 0x03, 0x04, // width, height
                0x80, 0, 0, 0, // flags, padding
                0, 0, // terminator
            ]
        );
    }

    #[test]
    fn sequence_header_stores_count_in_padding() {
        let mut writer = ByteWriter::new();
        let format = PixelFormat::default();
        write_header(
            &mut writer,
            &header(ContainerKind::Sequence, FormatFlags::default()),
            &format,
        )
        .unwrap();
        assert_eq!(&writer.as_slice()[..4], b"fbs\0");
        assert_eq!(&writer.as_slice()[13..16], &[0, 0, 7]);

        let mut reader = ByteReader::new(writer.as_slice());
        let parsed = read_header(&mut reader, ContainerKind::Sequence).unwrap();
        assert_eq!(parsed.frame_count, Some(7));
        assert_eq!(parsed.data_pointer, 18);
        assert_eq!(reader.position(), 18);
    }

    #[test]
    fn palette_entry_roundtrip() {
        let palette = Palette::from_colors([0xFF11_2233, 0xFF44_5566]).unwrap();
        let flags = FormatFlags {
            opaque: true,
            index: IndexMode::Index8,
            ..FormatFlags::default()
        };
        let format = PixelFormat::new(flags, Some(palette.clone())).unwrap();
        let mut writer = ByteWriter::new();
        write_header(&mut writer, &header(ContainerKind::Single, flags), &format).unwrap();

        // entry type, record count, 2 RGB records, terminator
        assert_eq!(
            &writer.as_slice()[16..],
            &[0, 1, 0, 2, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0, 0]
        );

        let mut reader = ByteReader::new(writer.as_slice());
        let parsed = read_header(&mut reader, ContainerKind::Single).unwrap();
        assert_eq!(parsed.format.palette, Some(palette));
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let mut writer = ByteWriter::new();
        let format = PixelFormat::default();
        write_header(
            &mut writer,
            &header(ContainerKind::Single, FormatFlags::default()),
            &format,
        )
        .unwrap();
        let mut reader = ByteReader::new(writer.as_slice());
        let err = read_header(&mut reader, ContainerKind::Sequence).unwrap_err();
        assert!(matches!(err, CodecError::InvalidTag { expected: "fbs", .. }));
    }

    #[test]
    fn unknown_entries_are_skipped() {
        let mut bytes = b"fbb ".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[0x12, 0x34, 0, 3, 0xAA, 0xBB, 0xCC]);
        bytes.extend_from_slice(&[0, 0]);
        let mut reader = ByteReader::new(&bytes);
        let parsed = read_header(&mut reader, ContainerKind::Single).unwrap();
        assert!(parsed.format.palette.is_none());
        assert_eq!(reader.position(), bytes.len());
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let mut bytes = b"fbb ".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 0, 0, 1, 0, 1, 0, 0, 0, 0]);
        bytes.extend_from_slice(&[0x12, 0x34, 0, 1, 0xAA]);
        bytes.extend_from_slice(&[0x12, 0x34, 0, 1, 0xBB]);
        bytes.extend_from_slice(&[0, 0]);
        let mut reader = ByteReader::new(&bytes);
        let err = read_header(&mut reader, ContainerKind::Single).unwrap_err();
        assert!(matches!(err, CodecError::DuplicateEntry(0x1234)));
    }

    #[test]
    fn single_header_drops_sequence_bits() {
        let mut bytes = b"fbb ".to_vec();
        bytes.extend_from_slice(&[0, 0, 0, 18, 0, 1, 0, 1, 0x08 | 0x04, 0, 0, 0, 0, 0]);
        let mut reader = ByteReader::new(&bytes);
        let parsed = read_header(&mut reader, ContainerKind::Single).unwrap();
        assert_eq!(parsed.format.flags.change_only, None);
    }

    #[test]
    fn sniff_identifies_both_kinds() {
        assert_eq!(sniff(b"fbb \0\0"), Some(ContainerKind::Single));
        assert_eq!(sniff(b"fbs\0\0\0"), Some(ContainerKind::Sequence));
        assert_eq!(sniff(b"qoif"), None);
        assert_eq!(sniff(b"fb"), None);
    }

    #[test]
    fn dimensions_limit() {
        assert_eq!(dimensions(65535, 1).unwrap(), (65535, 1));
        assert!(matches!(
            dimensions(65536, 1),
            Err(CodecError::Dimensions { width: 65536, .. })
        ));
    }
}
