//! The pixel grid the codecs read from and write into.
//!
//! The codecs only need a width, a height and row-major access to 32-bit
//! ARGB colors, expressed by the [`Frame`] trait. [`ArgbFrame`] is the
//! array-backed implementation used by the decoders by default.

pub mod color;
pub mod error;
pub mod frame;

pub use color::{pack_argb, pack_rgb, unpack_argb, OPAQUE};
pub use error::{FrameError, Result};
pub use frame::{ArgbFrame, Frame};
