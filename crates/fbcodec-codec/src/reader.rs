use fbcodec_primitives::{AsciiString, BinaryValue, StringLayout, Uint16, Uint32, Uint8};

use crate::error::Result;

/// Read cursor over a borrowed byte buffer.
///
/// Every read is bounds-checked against the whole buffer; reading past
/// its end fails with a bounds error and leaves the cursor unmoved.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor to an absolute offset. Seeking past the end is
    /// allowed; the next read fails.
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    pub fn read<T: BinaryValue>(&mut self) -> Result<T> {
        let (value, used) = T::decode(self.buf, self.pos)?;
        self.pos += used;
        Ok(value)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read::<Uint8>()?.get())
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(self.read::<Uint16>()?.get())
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(self.read::<Uint32>()?.get())
    }

    pub fn read_string(&mut self, layout: StringLayout) -> Result<AsciiString> {
        let (value, used) = AsciiString::decode(self.buf, self.pos, layout)?;
        self.pos += used;
        Ok(value)
    }

    /// Fail unless `len` more bytes exist after the cursor.
    pub fn require(&self, len: usize) -> Result<()> {
        fbcodec_primitives::value::take(self.buf, self.pos, len)?;
        Ok(())
    }

    /// Advance over `len` bytes that must exist.
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.require(len)?;
        self.pos += len;
        Ok(())
    }
}
