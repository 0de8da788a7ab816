//! Chained counters for run lengths and skip counts.
//!
//! A value `v` is written as `v / max` copies of `max` followed by
//! `v % max`. A reader sums values until it reads one below `max`.

use fbcodec_primitives::VarU15;

use crate::error::{CodecError, Result};
use crate::reader::ByteReader;
use crate::writer::ByteWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Counter {
    U8,
    U16,
    Var15,
}

impl Counter {
    pub(crate) const fn max(self) -> usize {
        match self {
            Counter::U8 => 0xFF,
            Counter::U16 => 0xFFFF,
            Counter::Var15 => VarU15::MAX as usize,
        }
    }

    fn unit_len(self, value: usize) -> usize {
        match self {
            Counter::U8 => 1,
            Counter::U16 => 2,
            Counter::Var15 => VarU15::len_of(value as u16),
        }
    }

    /// Bytes [`Counter::write`] emits for `value`.
    pub(crate) fn encoded_len(self, value: usize) -> usize {
        let max = self.max();
        (value / max) * self.unit_len(max) + self.unit_len(value % max)
    }

    pub(crate) fn write(self, writer: &mut ByteWriter, mut value: usize) -> Result<()> {
        let max = self.max();
        while value >= max {
            self.put(writer, max)?;
            value -= max;
        }
        self.put(writer, value)
    }

    pub(crate) fn read(self, reader: &mut ByteReader<'_>) -> Result<usize> {
        let max = self.max();
        let mut total = 0usize;
        loop {
            let value = match self {
                Counter::U8 => usize::from(reader.read_u8()?),
                Counter::U16 => usize::from(reader.read_u16()?),
                Counter::Var15 => usize::from(reader.read::<VarU15>()?.get()),
            };
            total = total
                .checked_add(value)
                .ok_or(CodecError::ValueOutOfRange {
                    what: "chained count",
                    value: u64::MAX,
                    max: usize::MAX as u64,
                })?;
            if value != max {
                return Ok(total);
            }
        }
    }

    fn put(self, writer: &mut ByteWriter, value: usize) -> Result<()> {
        match self {
            Counter::U8 => writer.put_u8(value as u8),
            Counter::U16 => writer.put_u16(value as u16),
            Counter::Var15 => writer.put(&VarU15::new(value as u16)?),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(counter: Counter, value: usize) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        counter.write(&mut writer, value).unwrap();
        writer.as_slice().to_vec()
    }

    fn read(counter: Counter, bytes: &[u8]) -> (usize, usize) {
        let mut reader = ByteReader::new(bytes);
        let value = counter.read(&mut reader).unwrap();
        (value, reader.position())
    }

    #[test]
    fn u8_chains_at_max() {
        assert_eq!(write(Counter::U8, 254), vec![0xFE]);
        assert_eq!(write(Counter::U8, 255), vec![0xFF, 0x00]);
        assert_eq!(write(Counter::U8, 511), vec![0xFF, 0xFF, 0x01]);
        assert_eq!(read(Counter::U8, &[0xFF, 0xFF, 0x01, 0x09]), (511, 3));
    }

    #[test]
    fn u16_chains_at_max() {
        assert_eq!(write(Counter::U16, 0xFFFF), vec![0xFF, 0xFF, 0x00, 0x00]);
        assert_eq!(read(Counter::U16, &[0xFF, 0xFF, 0x00, 0x01]), (0x10000, 4));
    }

    #[test]
    fn var15_short_and_long_units() {
        assert_eq!(write(Counter::Var15, 127), vec![0x7F]);
        assert_eq!(write(Counter::Var15, 128), vec![0x80, 0x80]);
        assert_eq!(write(Counter::Var15, 0x7FFF), vec![0xFF, 0xFF, 0x00]);
        assert_eq!(read(Counter::Var15, &[0xFF, 0xFF, 0x05]), (0x7FFF + 5, 3));
    }

    #[test]
    fn encoded_len_matches_write() {
        for counter in [Counter::U8, Counter::U16, Counter::Var15] {
            for value in [0, 1, 127, 128, 254, 255, 256, 0x7FFE, 0x7FFF, 0xFFFF, 70_000] {
                assert_eq!(
                    counter.encoded_len(value),
                    write(counter, value).len(),
                    "{counter:?} {value}"
                );
            }
        }
    }

    #[test]
    fn truncated_chain_is_bounds_error() {
        let mut reader = ByteReader::new(&[0xFF]);
        assert!(Counter::U8.read(&mut reader).is_err());
    }
}
