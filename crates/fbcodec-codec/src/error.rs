use fbcodec_frame::FrameError;
use fbcodec_primitives::PrimitiveError;

/// Errors that can occur while encoding or decoding frame buffers.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A primitive value could not be read or constructed.
    #[error("primitive error: {0}")]
    Primitive(#[from] PrimitiveError),

    /// A frame could not be built.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The buffer does not start with the expected type tag.
    #[error("invalid type tag (expected {expected:?}, found {found:?})")]
    InvalidTag {
        expected: &'static str,
        found: String,
    },

    /// A header table holds the same entry type twice.
    #[error("header entry type {0:#06x} appears more than once")]
    DuplicateEntry(u16),

    /// A pixel references a palette index that was never defined.
    #[error("palette index {0} is not defined")]
    PaletteMiss(u16),

    /// A palette holds more colors than its index width can address.
    #[error("palette of {len} colors exceeds capacity {capacity}")]
    PaletteOverflow { len: usize, capacity: usize },

    /// The flag byte holds an impossible combination.
    #[error("invalid flag byte {bits:#010b}: {reason}")]
    InvalidFlags { bits: u8, reason: &'static str },

    /// A decoded value lies outside the range its context allows.
    #[error("{what} {value} out of range (max {max})")]
    ValueOutOfRange {
        what: &'static str,
        value: u64,
        max: u64,
    },

    /// A pixel run extends past the last pixel of the frame.
    #[error("pixel stream overruns frame ({index} + {count} > {pixels})")]
    PixelOverrun {
        index: usize,
        count: usize,
        pixels: usize,
    },

    /// A sequence declared a frame that no record defined.
    #[error("frame {0} was never defined")]
    MissingFrame(usize),

    /// A frame record type byte is not known.
    #[error("unknown frame record type {0:#04x}")]
    UnknownRecord(u8),

    /// A known record type appeared where it is not allowed.
    #[error("unexpected {0} record")]
    UnexpectedRecord(&'static str),

    /// A frame record is shorter than its own fixed head.
    #[error("frame record length {0} is shorter than the record head")]
    RecordTooShort(usize),

    /// A stream chunk ends in the middle of a frame record.
    #[error("frame record at {offset} needs {length} bytes, chunk has {available}")]
    SplitRecord {
        offset: usize,
        length: usize,
        available: usize,
    },

    /// A decoded header exceeds the configured decoder limits.
    #[error("{what} {value} exceeds configured limit {limit}")]
    LimitExceeded {
        what: &'static str,
        value: usize,
        limit: usize,
    },

    /// An explicitly assigned palette lacks a color the frame uses.
    #[error("color {0:#010x} is not in the palette")]
    ColorNotInPalette(u32),

    /// Frame dimensions do not fit the 16-bit header fields.
    #[error("frame size {width}x{height} not encodable (max 65535x65535)")]
    Dimensions { width: usize, height: usize },

    /// A frame in a sequence differs in size from the first frame.
    #[error("frame {index} is {width}x{height}, expected {expected_width}x{expected_height}")]
    MismatchedFrame {
        index: usize,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    /// A sequence has no frames or more than the format can count.
    #[error("sequence must hold 1..={max} frames, got {len}")]
    SequenceLength { len: usize, max: usize },

    /// The buffer holds an open-ended stream, not a finite sequence.
    #[error("buffer holds an open-ended stream; decode it chunk by chunk")]
    OpenEndedStream,

    /// A chunk arrived after the end-of-stream record.
    #[error("stream already closed")]
    StreamClosed,
}

/// Classification of [`CodecError`] by who is at fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input bytes are not a valid encoding.
    Format,
    /// The input ended before a complete value could be read.
    Bounds,
    /// The caller violated an API contract.
    Contract,
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Primitive(
                PrimitiveError::UnexpectedEof { .. } | PrimitiveError::Unterminated { .. },
            )
            | CodecError::SplitRecord { .. } => ErrorKind::Bounds,
            CodecError::Primitive(PrimitiveError::NonAscii { .. }) => ErrorKind::Format,
            CodecError::Primitive(_)
            | CodecError::Frame(_)
            | CodecError::ColorNotInPalette(_)
            | CodecError::Dimensions { .. }
            | CodecError::MismatchedFrame { .. }
            | CodecError::SequenceLength { .. }
            | CodecError::StreamClosed => ErrorKind::Contract,
            _ => ErrorKind::Format,
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
