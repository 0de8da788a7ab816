//! Frame-sequence codec (`"fbs\0"` containers).
//!
//! The data section is `recordsDefined:u16 | pad:u16` followed by frame
//! records:
//!
//! ```text
//! ┌──────────────┬──────────────┬─────────────┬──────────┬──────────────┐
//! │ Length (4B)  │ Frame # (2B) │ Repeats (1B)│ Type (1B)│ Body …       │
//! │ incl. head   │              │             │          │              │
//! └──────────────┴──────────────┴─────────────┴──────────┴──────────────┘
//! ```

use bytes::Bytes;
use fbcodec_frame::Frame;
use tracing::{debug, trace, warn};

use crate::config::{DecoderConfig, EncodeOptions};
use crate::error::{CodecError, Result};
use crate::flags::{FormatFlags, IndexMode, RleMode, SkipMode};
use crate::header::{self, ContainerKind, Header, STREAM_FRAME_COUNT};
use crate::palette::{normalize, Palette};
use crate::pixels::{choose_rle, PixelFormat};
use crate::reader::ByteReader;
use crate::writer::ByteWriter;

/// Bytes in a record head: length, frame number, repetitions and type.
pub const RECORD_HEAD_LEN: usize = 8;

/// Most frames a finite sequence can hold.
pub const MAX_FRAMES: usize = STREAM_FRAME_COUNT as usize - 1;

/// Most extra copies one record can stand for.
pub const MAX_REPETITIONS: u8 = u8::MAX;

/// Frame record type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    /// Seeded from the previous frame; skip counts in change-only mode.
    Default = 0x00,
    /// A complete frame.
    Keyframe = 0x01,
    /// New flags and optionally a new palette.
    Option = 0x80,
    /// End of a stream.
    End = 0xFF,
}

impl RecordType {
    pub fn name(self) -> &'static str {
        match self {
            RecordType::Default => "DEFAULT",
            RecordType::Keyframe => "KEYFRAME",
            RecordType::Option => "OPTION",
            RecordType::End => "END",
        }
    }
}

impl TryFrom<u8> for RecordType {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0x00 => Ok(RecordType::Default),
            0x01 => Ok(RecordType::Keyframe),
            0x80 => Ok(RecordType::Option),
            0xFF => Ok(RecordType::End),
            other => Err(CodecError::UnknownRecord(other)),
        }
    }
}

/// Write one record, patching its length once `body` returns.
pub(crate) fn write_record(
    writer: &mut ByteWriter,
    frame_number: u16,
    repetitions: u8,
    kind: RecordType,
    body: impl FnOnce(&mut ByteWriter) -> Result<()>,
) -> Result<()> {
    let start = writer.position();
    writer.put_u32(0);
    writer.put_u16(frame_number);
    writer.put_u8(repetitions);
    writer.put_u8(kind as u8);
    body(writer)?;
    let len = writer.position() - start;
    writer.patch_u32(start, header::to_u32(len, "record length")?);
    trace!(frame_number, repetitions, kind = kind.name(), len, "wrote record");
    Ok(())
}

/// Body of an OPTION record.
pub(crate) fn write_option_body(writer: &mut ByteWriter, format: &PixelFormat) {
    writer.put(&format.flags.to_byte_flags());
    header::write_table(writer, format);
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RecordHead {
    pub start: usize,
    pub len: usize,
    pub frame_number: u16,
    pub repetitions: u8,
    pub kind: RecordType,
}

impl RecordHead {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

pub(crate) fn read_record_head(reader: &mut ByteReader<'_>) -> Result<RecordHead> {
    let start = reader.position();
    let len = reader.read_u32()? as usize;
    if len < RECORD_HEAD_LEN {
        return Err(CodecError::RecordTooShort(len));
    }
    let frame_number = reader.read_u16()?;
    let repetitions = reader.read_u8()?;
    let kind = RecordType::try_from(reader.read_u8()?)?;
    trace!(frame_number, repetitions, kind = kind.name(), len, "read record");
    Ok(RecordHead {
        start,
        len,
        frame_number,
        repetitions,
        kind,
    })
}

/// Replace the active flags from an OPTION body. A palette entry replaces
/// the active palette; without one the old palette stays.
pub(crate) fn apply_option(reader: &mut ByteReader<'_>, format: &mut PixelFormat) -> Result<()> {
    let flags = FormatFlags::from_byte_flags(reader.read()?)?;
    let palette = header::read_table(reader, flags.opaque)?;
    let palette = palette.or_else(|| format.palette.take());
    *format = PixelFormat::new(flags, palette)?;
    debug!(flags = %flags, "applied option record");
    Ok(())
}

/// Decode the frame carried by a DEFAULT or KEYFRAME record.
pub(crate) fn read_record_frame<F: Frame>(
    reader: &mut ByteReader<'_>,
    head: &RecordHead,
    format: &PixelFormat,
    previous: Option<&F>,
    width: usize,
    height: usize,
) -> Result<F> {
    let (mut frame, delta) = match (head.kind, previous) {
        (RecordType::Default, Some(previous)) => (previous.clone(), true),
        (RecordType::Default, None) => (F::blank(width, height), true),
        _ => (F::blank(width, height), false),
    };
    format.read_body(reader, head.end(), &mut frame, delta)?;
    Ok(frame)
}

/// Move the reader to the end of the record, warning if the body did not
/// fill it exactly.
pub(crate) fn finish_record(reader: &mut ByteReader<'_>, head: &RecordHead) {
    if reader.position() != head.end() {
        warn!(
            frame_number = head.frame_number,
            consumed = reader.position() - head.start,
            declared = head.len,
            "frame record length mismatch"
        );
    }
    reader.seek(head.end());
}

fn same_pixels<F: Frame>(a: &F, b: &F, opaque: bool) -> bool {
    (0..a.pixel_count())
        .all(|i| normalize(a.color_indexed(i), opaque) == normalize(b.color_indexed(i), opaque))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlannedRecord {
    frame: usize,
    repetitions: u8,
    kind: RecordType,
    body_len: usize,
}

/// Encodes a sequence of equally sized frames.
#[derive(Debug, Clone)]
pub struct SequenceEncoder<'f, F: Frame> {
    frames: &'f [F],
    rle: RleMode,
    opaque: bool,
    change_only: Option<SkipMode>,
    palette: Option<Palette>,
}

impl<'f, F: Frame> SequenceEncoder<'f, F> {
    pub fn new(frames: &'f [F]) -> Self {
        Self::with_options(frames, EncodeOptions::default())
    }

    pub fn with_options(frames: &'f [F], options: EncodeOptions) -> Self {
        Self {
            frames,
            rle: options.rle,
            opaque: options.opaque,
            change_only: options.change_only,
            palette: None,
        }
    }

    pub fn rle(&self) -> RleMode {
        self.rle
    }

    pub fn set_rle(&mut self, rle: RleMode) {
        self.rle = rle;
    }

    pub fn set_opaque(&mut self, opaque: bool) {
        self.opaque = opaque;
    }

    pub fn set_change_only(&mut self, change_only: Option<SkipMode>) {
        self.change_only = change_only;
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    pub fn set_palette(&mut self, palette: Option<Palette>) {
        self.palette = palette;
    }

    pub fn index_mode(&self) -> IndexMode {
        self.palette
            .as_ref()
            .map_or(IndexMode::Direct, Palette::index_mode)
    }

    /// Build one palette over every frame. Returns `false` and leaves the
    /// encoder unindexed when there are too many distinct colors.
    pub fn try_indexed(&mut self) -> bool {
        self.palette = Palette::scan(self.frames, self.opaque);
        self.palette.is_some()
    }

    /// Select the RLE mode with the smallest data section, counting skip
    /// counts, keyframe choices and deduplication.
    pub fn try_rle(&mut self) -> Result<RleMode> {
        let rle = choose_rle(|rle| {
            let format = self.format(rle)?;
            Ok(self.plan(&format).iter().map(|r| r.body_len).sum())
        })?;
        debug!(rle = rle.name(), "selected run-length mode");
        self.rle = rle;
        Ok(rle)
    }

    pub fn optimize(&mut self) -> Result<()> {
        self.try_indexed();
        self.try_rle()?;
        Ok(())
    }

    fn format(&self, rle: RleMode) -> Result<PixelFormat> {
        let flags = FormatFlags {
            rle,
            opaque: self.opaque,
            index: self.index_mode(),
            change_only: self.change_only,
        };
        let palette = self.palette.as_ref().map(|p| p.normalized(self.opaque));
        PixelFormat::new(flags, palette)
    }

    fn validate(&self) -> Result<(u16, u16)> {
        let first = match self.frames.first() {
            Some(first) if self.frames.len() <= MAX_FRAMES => first,
            _ => {
                return Err(CodecError::SequenceLength {
                    len: self.frames.len(),
                    max: MAX_FRAMES,
                })
            }
        };
        for (index, frame) in self.frames.iter().enumerate() {
            if frame.width() != first.width() || frame.height() != first.height() {
                return Err(CodecError::MismatchedFrame {
                    index,
                    width: frame.width(),
                    height: frame.height(),
                    expected_width: first.width(),
                    expected_height: first.height(),
                });
            }
        }
        header::dimensions(first.width(), first.height())
    }

    fn plan(&self, format: &PixelFormat) -> Vec<PlannedRecord> {
        let mut records: Vec<PlannedRecord> = Vec::new();
        for (index, frame) in self.frames.iter().enumerate() {
            let previous = index.checked_sub(1).map(|i| &self.frames[i]);

            if let (Some(last), Some(previous)) = (records.last_mut(), previous) {
                if last.repetitions < MAX_REPETITIONS && same_pixels(previous, frame, self.opaque) {
                    last.repetitions += 1;
                    continue;
                }
            }

            let full_len = format.body_len(frame, None);
            let record = match previous {
                None => PlannedRecord {
                    frame: index,
                    repetitions: 0,
                    kind: RecordType::Keyframe,
                    body_len: full_len,
                },
                Some(previous) if self.change_only.is_some() => {
                    let delta_len = format.body_len(frame, Some(previous));
                    if full_len <= delta_len {
                        PlannedRecord {
                            frame: index,
                            repetitions: 0,
                            kind: RecordType::Keyframe,
                            body_len: full_len,
                        }
                    } else {
                        PlannedRecord {
                            frame: index,
                            repetitions: 0,
                            kind: RecordType::Default,
                            body_len: delta_len,
                        }
                    }
                }
                Some(_) => PlannedRecord {
                    frame: index,
                    repetitions: 0,
                    kind: RecordType::Default,
                    body_len: full_len,
                },
            };
            records.push(record);
        }
        records
    }

    pub fn encode(&self) -> Result<Bytes> {
        let (width, height) = self.validate()?;
        let format = self.format(self.rle)?;
        let records = self.plan(&format);

        let header = Header {
            kind: ContainerKind::Sequence,
            width,
            height,
            flags: format.flags,
            frame_count: self.frames.len() as u16,
        };
        let mut writer = ByteWriter::new();
        header::write_header(&mut writer, &header, &format)?;

        writer.put_u16(records.len() as u16);
        writer.put_u16(0);
        for record in &records {
            let frame = &self.frames[record.frame];
            let previous = match record.kind {
                RecordType::Default => record.frame.checked_sub(1).map(|i| &self.frames[i]),
                _ => None,
            };
            write_record(
                &mut writer,
                record.frame as u16,
                record.repetitions,
                record.kind,
                |writer| format.write_body(writer, frame, previous),
            )?;
        }

        debug!(
            frames = self.frames.len(),
            records = records.len(),
            flags = %format.flags,
            bytes = writer.position(),
            "encoded sequence"
        );
        Ok(writer.freeze())
    }
}

/// Decodes finite frame sequences held in one buffer.
#[derive(Debug, Clone, Default)]
pub struct SequenceDecoder {
    config: DecoderConfig,
    used_bytes: usize,
}

impl SequenceDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            used_bytes: 0,
        }
    }

    /// Offset just past the last record of the last decoded sequence.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn decode<F: Frame>(&mut self, bytes: &[u8]) -> Result<Vec<F>> {
        let mut reader = ByteReader::new(bytes);
        let header = header::read_header(&mut reader, ContainerKind::Sequence)?;
        let frame_count = header.frame_count.unwrap_or(0);
        if frame_count == STREAM_FRAME_COUNT {
            return Err(CodecError::OpenEndedStream);
        }
        let frame_count = usize::from(frame_count);
        self.config.check_frames(frame_count)?;
        self.config.check_pixels(header.width, header.height)?;

        reader.seek(header.data_pointer);
        let records = reader.read_u16()?;
        reader.skip(2)?;

        let mut format = header.format;
        let mut slots: Vec<Option<F>> = vec![None; frame_count];
        let mut last: Option<F> = None;

        for _ in 0..records {
            let head = read_record_head(&mut reader)?;
            reader.require(head.len - RECORD_HEAD_LEN)?;
            match head.kind {
                RecordType::Option => apply_option(&mut reader, &mut format)?,
                RecordType::End => return Err(CodecError::UnexpectedRecord(head.kind.name())),
                RecordType::Default | RecordType::Keyframe => {
                    let frame = read_record_frame(
                        &mut reader,
                        &head,
                        &format,
                        last.as_ref(),
                        header.width,
                        header.height,
                    )?;
                    let first = usize::from(head.frame_number);
                    let final_index = first + usize::from(head.repetitions);
                    if final_index >= frame_count {
                        return Err(CodecError::ValueOutOfRange {
                            what: "frame number",
                            value: final_index as u64,
                            max: frame_count.saturating_sub(1) as u64,
                        });
                    }
                    for slot in &mut slots[first..=final_index] {
                        *slot = Some(frame.clone());
                    }
                    last = Some(frame);
                }
            }
            finish_record(&mut reader, &head);
        }

        self.used_bytes = reader.position();
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| slot.ok_or(CodecError::MissingFrame(index)))
            .collect()
    }
}
