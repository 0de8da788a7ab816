//! Primitive binary value types shared by the frame buffer formats.
//!
//! Everything on the wire is built from a small, closed set of values:
//! - [`Uint8`], [`Uint16`], [`Uint32`]: fixed width, big-endian
//! - [`VarU15`]: one byte for `0..=0x7F`, two bytes up to `0x7FFF`
//! - [`AsciiString`]: fixed length or NUL-terminated ASCII
//! - [`ByteFlags`]: eight named booleans packed MSB-first
//!
//! All of them encode into any [`bytes::BufMut`] and decode from a byte
//! slice at an offset, reporting how many bytes they consumed.

pub mod ascii;
pub mod error;
pub mod flags;
pub mod uint;
pub mod value;
pub mod varint;

pub use ascii::{AsciiString, StringLayout};
pub use error::{PrimitiveError, Result};
pub use flags::ByteFlags;
pub use uint::{Uint16, Uint32, Uint8};
pub use value::BinaryValue;
pub use varint::VarU15;
