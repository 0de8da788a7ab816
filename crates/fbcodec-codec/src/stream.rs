//! Open-ended frame streams.
//!
//! A stream is a sequence container whose frame count is `0xFFFF`. The
//! producer hands out record-aligned chunks: the first carries the header,
//! every later one whole records, and the last an END record. Finite
//! sequences can be decoded the same way when split at record boundaries.

use bytes::Bytes;
use fbcodec_frame::Frame;
use tracing::{debug, warn};

use crate::config::{DecoderConfig, EncodeOptions};
use crate::error::{CodecError, Result};
use crate::flags::{FormatFlags, IndexMode};
use crate::header::{self, ContainerKind, Header, STREAM_FRAME_COUNT};
use crate::palette::{normalize, Palette};
use crate::pixels::PixelFormat;
use crate::reader::ByteReader;
use crate::sequence::{self, RecordType, RECORD_HEAD_LEN};
use crate::writer::ByteWriter;

#[derive(Debug, Clone)]
struct StreamState<F> {
    width: usize,
    height: usize,
    format: PixelFormat,
    last: Option<F>,
}

/// Decodes a stream chunk by chunk, keeping the active format and the
/// last frame between calls.
#[derive(Debug, Clone)]
pub struct StreamDecoder<F: Frame> {
    config: DecoderConfig,
    state: Option<StreamState<F>>,
    closed: bool,
}

impl<F: Frame> Default for StreamDecoder<F> {
    fn default() -> Self {
        Self::with_config(DecoderConfig::default())
    }
}

impl<F: Frame> StreamDecoder<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            state: None,
            closed: false,
        }
    }

    /// Whether an END record has been decoded.
    pub fn closed(&self) -> bool {
        self.closed
    }

    pub fn header_decoded(&self) -> bool {
        self.state.is_some()
    }

    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.state.as_ref().map(|state| (state.width, state.height))
    }

    /// Flags currently in effect, including changes made by OPTION records.
    pub fn flags(&self) -> Option<FormatFlags> {
        self.state.as_ref().map(|state| state.format.flags)
    }

    /// Decode one chunk and return the frames it completes, repetitions
    /// expanded. The first chunk must start with the container header.
    pub fn decode_chunk(&mut self, chunk: &[u8]) -> Result<Vec<F>> {
        if self.closed {
            return Err(CodecError::StreamClosed);
        }
        let mut reader = ByteReader::new(chunk);
        let mut state = match self.state.take() {
            Some(state) => state,
            None => self.read_header(&mut reader)?,
        };
        let result = self.read_records(&mut reader, &mut state);
        self.state = Some(state);
        result
    }

    fn read_header(&self, reader: &mut ByteReader<'_>) -> Result<StreamState<F>> {
        let header = header::read_header(reader, ContainerKind::Sequence)?;
        self.config.check_pixels(header.width, header.height)?;
        reader.seek(header.data_pointer);
        let records = reader.read_u16()?;
        reader.skip(2)?;
        debug!(
            width = header.width,
            height = header.height,
            flags = %header.format.flags,
            open_ended = header.frame_count == Some(STREAM_FRAME_COUNT),
            records,
            "stream header"
        );
        Ok(StreamState {
            width: header.width,
            height: header.height,
            format: header.format,
            last: None,
        })
    }

    fn read_records(
        &mut self,
        reader: &mut ByteReader<'_>,
        state: &mut StreamState<F>,
    ) -> Result<Vec<F>> {
        let mut frames = Vec::new();
        while reader.remaining() > 0 {
            let offset = reader.position();
            let available = reader.remaining();
            if available < RECORD_HEAD_LEN {
                return Err(CodecError::SplitRecord {
                    offset,
                    length: RECORD_HEAD_LEN,
                    available,
                });
            }
            let head = sequence::read_record_head(reader)?;
            if head.len > available {
                return Err(CodecError::SplitRecord {
                    offset,
                    length: head.len,
                    available,
                });
            }

            match head.kind {
                RecordType::Option => sequence::apply_option(reader, &mut state.format)?,
                RecordType::End => {
                    sequence::finish_record(reader, &head);
                    self.closed = true;
                    if reader.remaining() > 0 {
                        warn!(
                            trailing = reader.remaining(),
                            "ignoring bytes after end of stream"
                        );
                    }
                    debug!("stream closed");
                    return Ok(frames);
                }
                RecordType::Default | RecordType::Keyframe => {
                    let frame = sequence::read_record_frame(
                        reader,
                        &head,
                        &state.format,
                        state.last.as_ref(),
                        state.width,
                        state.height,
                    )?;
                    for _ in 0..head.repetitions {
                        frames.push(frame.clone());
                    }
                    frames.push(frame.clone());
                    state.last = Some(frame);
                }
            }
            sequence::finish_record(reader, &head);
        }
        Ok(frames)
    }
}

/// Produces record-aligned chunks for a [`StreamDecoder`].
///
/// The header goes out with the first chunk. With indexing on, the
/// palette is seeded from the first frame and grows through OPTION
/// records; once it would overflow, indexing is switched off.
#[derive(Debug, Clone)]
pub struct StreamEncoder<F: Frame> {
    width: u16,
    height: u16,
    format: PixelFormat,
    indexing: bool,
    header_written: bool,
    finished: bool,
    next_frame: u16,
    previous: Option<F>,
}

impl<F: Frame> StreamEncoder<F> {
    pub fn new(width: usize, height: usize, options: EncodeOptions) -> Result<Self> {
        let (width, height) = header::dimensions(width, height)?;
        let flags = FormatFlags {
            rle: options.rle,
            opaque: options.opaque,
            index: IndexMode::Direct,
            change_only: options.change_only,
        };
        Ok(Self {
            width,
            height,
            format: PixelFormat::new(flags, None)?,
            indexing: false,
            header_written: false,
            finished: false,
            next_frame: 0,
            previous: None,
        })
    }

    pub fn with_indexing(mut self, indexing: bool) -> Self {
        self.indexing = indexing;
        self
    }

    pub fn flags(&self) -> FormatFlags {
        self.format.flags
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.format.palette.as_ref()
    }

    /// Frames pushed so far, modulo 2^16.
    pub fn frame_number(&self) -> u16 {
        self.next_frame
    }

    fn write_header(&mut self, writer: &mut ByteWriter) -> Result<()> {
        let header = Header {
            kind: ContainerKind::Sequence,
            width: self.width,
            height: self.height,
            flags: self.format.flags,
            frame_count: STREAM_FRAME_COUNT,
        };
        header::write_header(writer, &header, &self.format)?;
        writer.put_u16(0);
        writer.put_u16(0);
        self.header_written = true;
        Ok(())
    }

    fn write_option(&self, writer: &mut ByteWriter) -> Result<()> {
        sequence::write_record(writer, self.next_frame, 0, RecordType::Option, |writer| {
            sequence::write_option_body(writer, &self.format);
            Ok(())
        })
    }

    fn set_palette(&mut self, palette: Option<Palette>) -> Result<()> {
        let index = palette
            .as_ref()
            .map_or(IndexMode::Direct, Palette::index_mode);
        let flags = FormatFlags {
            index,
            ..self.format.flags
        };
        self.format = PixelFormat::new(flags, palette)?;
        Ok(())
    }

    /// Add colors `frame` uses that the palette lacks. Returns whether the
    /// format changed.
    fn grow_palette(&mut self, frame: &F) -> Result<bool> {
        let opaque = self.format.flags.opaque;
        let mut palette = self.format.palette.clone().unwrap_or_default();
        let before = palette.len();
        for i in 0..frame.pixel_count() {
            let color = normalize(frame.color_indexed(i), opaque);
            if palette.contains(color) {
                continue;
            }
            if palette.push(color).is_err() {
                debug!(
                    limit = Palette::MAX_LEN,
                    "stream palette overflow, indexing disabled"
                );
                self.indexing = false;
                self.set_palette(None)?;
                return Ok(true);
            }
        }
        if palette.len() == before && self.format.palette.is_some() {
            return Ok(false);
        }
        self.set_palette(Some(palette))?;
        Ok(true)
    }

    /// Encode one frame as a chunk.
    pub fn push_frame(&mut self, frame: &F) -> Result<Bytes> {
        if self.finished {
            return Err(CodecError::StreamClosed);
        }
        if frame.width() != usize::from(self.width) || frame.height() != usize::from(self.height)
        {
            return Err(CodecError::MismatchedFrame {
                index: usize::from(self.next_frame),
                width: frame.width(),
                height: frame.height(),
                expected_width: usize::from(self.width),
                expected_height: usize::from(self.height),
            });
        }

        let mut writer = ByteWriter::new();
        if !self.header_written {
            if self.indexing {
                self.grow_palette(frame)?;
            }
            self.write_header(&mut writer)?;
        } else if self.indexing && self.grow_palette(frame)? {
            self.write_option(&mut writer)?;
        }

        let full_len = self.format.body_len(frame, None);
        let (kind, previous) = match &self.previous {
            Some(previous) if self.format.flags.change_only.is_some() => {
                if full_len <= self.format.body_len(frame, Some(previous)) {
                    (RecordType::Keyframe, None)
                } else {
                    (RecordType::Default, Some(previous))
                }
            }
            Some(_) => (RecordType::Default, None),
            None => (RecordType::Keyframe, None),
        };
        let format = &self.format;
        sequence::write_record(&mut writer, self.next_frame, 0, kind, |writer| {
            format.write_body(writer, frame, previous)
        })?;

        self.next_frame = self.next_frame.wrapping_add(1);
        self.previous = Some(frame.clone());
        Ok(writer.freeze())
    }

    /// Change compression options for the frames that follow. The palette
    /// and indexing state are kept.
    pub fn set_options(&mut self, options: EncodeOptions) -> Result<Bytes> {
        if self.finished {
            return Err(CodecError::StreamClosed);
        }
        let flags = FormatFlags {
            rle: options.rle,
            opaque: options.opaque,
            change_only: options.change_only,
            ..self.format.flags
        };
        let palette = self
            .format
            .palette
            .as_ref()
            .map(|palette| palette.normalized(options.opaque));
        self.format = PixelFormat::new(flags, palette)?;

        let mut writer = ByteWriter::new();
        if self.header_written {
            self.write_option(&mut writer)?;
        }
        Ok(writer.freeze())
    }

    /// The END record, preceded by the header if no frame was pushed.
    pub fn finish(&mut self) -> Result<Bytes> {
        if self.finished {
            return Err(CodecError::StreamClosed);
        }
        let mut writer = ByteWriter::new();
        if !self.header_written {
            self.write_header(&mut writer)?;
        }
        sequence::write_record(&mut writer, self.next_frame, 0, RecordType::End, |_| Ok(()))?;
        self.finished = true;
        Ok(writer.freeze())
    }
}
