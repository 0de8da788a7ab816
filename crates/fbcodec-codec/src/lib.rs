//! Compact binary encodings for ARGB frame buffers and frame sequences.
//!
//! Two container formats share one header layout:
//! - `"fbb "`: a single frame
//! - `"fbs\0"`: a sequence of equally sized frames, or an open-ended
//!   stream when the declared frame count is `0xFFFF`
//!
//! Pixels are written as direct ARGB, RGB (opaque) or palette indices,
//! optionally run-length encoded. Sequences additionally collapse repeated
//! frames and can store only the pixels that changed since the previous
//! frame.

pub mod config;
mod counter;
pub mod error;
pub mod flags;
pub mod header;
pub mod palette;
mod pixels;
pub mod reader;
pub mod sequence;
pub mod single;
pub mod stream;
pub mod writer;

use bytes::Bytes;
use fbcodec_frame::Frame;

pub use config::{DecoderConfig, EncodeOptions, DEFAULT_MAX_FRAMES, DEFAULT_MAX_PIXELS};
pub use error::{CodecError, ErrorKind, Result};
pub use flags::{FormatFlags, IndexMode, RleMode, SkipMode, FLAG_NAMES};
pub use header::{inspect, sniff, ContainerKind, HeaderInfo, SEQUENCE_TAG, SINGLE_TAG};
pub use palette::Palette;
pub use reader::ByteReader;
pub use sequence::{RecordType, SequenceDecoder, SequenceEncoder};
pub use single::{decode_frame, encode_frame, Decoder, Encoder};
pub use stream::{StreamDecoder, StreamEncoder};
pub use writer::ByteWriter;

/// Encode `frames` as a finite sequence with fixed options.
pub fn encode_sequence<F: Frame>(frames: &[F], options: EncodeOptions) -> Result<Bytes> {
    SequenceEncoder::with_options(frames, options).encode()
}

/// Decode a finite sequence with the default limits.
pub fn decode_sequence<F: Frame>(bytes: &[u8]) -> Result<Vec<F>> {
    SequenceDecoder::new().decode(bytes)
}
