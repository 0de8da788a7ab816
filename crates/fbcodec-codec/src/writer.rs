use bytes::{BufMut, Bytes, BytesMut};
use fbcodec_primitives::{AsciiString, BinaryValue};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Growable output buffer with back-patching of length and pointer fields.
#[derive(Debug, Default)]
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::with_capacity(INITIAL_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Offset the next write lands at.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    pub fn put<T: BinaryValue>(&mut self, value: &T) {
        value.encode(&mut self.buf);
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    pub fn put_u16(&mut self, value: u16) {
        self.buf.put_u16(value);
    }

    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    pub fn put_string(&mut self, value: &AsciiString) {
        value.encode(&mut self.buf);
    }

    pub fn put_zeros(&mut self, len: usize) {
        self.buf.put_bytes(0, len);
    }

    /// Overwrite a previously written big-endian `u16`.
    pub fn patch_u16(&mut self, at: usize, value: u16) {
        self.buf[at..at + 2].copy_from_slice(&value.to_be_bytes());
    }

    /// Overwrite a previously written big-endian `u32`.
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        self.buf[at..at + 4].copy_from_slice(&value.to_be_bytes());
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }
}
