//! Compact binary encodings for ARGB frame buffers and frame sequences.
//!
//! # Crate Structure
//!
//! - [`primitives`]: fixed-width integers, 7/15-bit varints, ASCII tags, flag bytes
//! - [`frame`]: the [`frame::Frame`] trait and the array-backed [`frame::ArgbFrame`]
//! - [`codec`]: single-frame, sequence and streaming encoders and decoders
//!
//! ```
//! use fbcodec::codec::{decode_sequence, encode_sequence, EncodeOptions, RleMode, SkipMode};
//! use fbcodec::frame::ArgbFrame;
//!
//! let frames = vec![
//!     ArgbFrame::filled(4, 4, 0xFF00_0000),
//!     ArgbFrame::filled(4, 4, 0xFF00_0000),
//!     ArgbFrame::filled(4, 4, 0xFFFF_FFFF),
//! ];
//! let options = EncodeOptions {
//!     rle: RleMode::Rle8,
//!     change_only: Some(SkipMode::Co8),
//!     ..EncodeOptions::default()
//! };
//! let bytes = encode_sequence(&frames, options).unwrap();
//! let decoded: Vec<ArgbFrame> = decode_sequence(&bytes).unwrap();
//! assert_eq!(decoded, frames);
//! ```

/// Re-export primitive value types.
pub mod primitives {
    pub use fbcodec_primitives::*;
}

/// Re-export frame types.
pub mod frame {
    pub use fbcodec_frame::*;
}

/// Re-export codec types.
pub mod codec {
    pub use fbcodec_codec::*;
}
