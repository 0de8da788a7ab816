//! Eight booleans packed into one byte, most significant bit first.

use std::fmt;

use bytes::BufMut;

use crate::error::Result;
use crate::value::{take, BinaryValue};

/// Bit `i` of a [`ByteFlags`] lives at mask `0x80 >> i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ByteFlags(u8);

impl ByteFlags {
    /// Number of flags in the byte.
    pub const COUNT: usize = 8;

    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Mask of flag `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 8`.
    pub const fn mask(index: usize) -> u8 {
        assert!(index < Self::COUNT, "flag index out of range");
        0x80 >> index
    }

    pub const fn get(self, index: usize) -> bool {
        self.0 & Self::mask(index) != 0
    }

    pub fn set(&mut self, index: usize, value: bool) {
        if value {
            self.0 |= Self::mask(index);
        } else {
            self.0 &= !Self::mask(index);
        }
    }

    /// Builder-style [`ByteFlags::set`].
    pub fn with(mut self, index: usize, value: bool) -> Self {
        self.set(index, value);
        self
    }

    pub fn iter(self) -> impl Iterator<Item = bool> {
        (0..Self::COUNT).map(move |i| self.get(i))
    }

    /// Names of the set flags, given one name per bit index.
    pub fn set_names<'a>(self, names: &[&'a str; 8]) -> Vec<&'a str> {
        self.iter()
            .zip(names.iter())
            .filter_map(|(set, name)| set.then_some(*name))
            .collect()
    }
}

impl BinaryValue for ByteFlags {
    fn encoded_len(&self) -> usize {
        1
    }

    fn encode<B: BufMut>(&self, dst: &mut B) {
        dst.put_u8(self.0);
    }

    fn decode(src: &[u8], offset: usize) -> Result<(Self, usize)> {
        Ok((Self(take(src, offset, 1)?[0]), 1))
    }
}

impl fmt::Display for ByteFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010b}", self.0)
    }
}
