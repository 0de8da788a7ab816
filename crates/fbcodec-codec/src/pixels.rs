//! Pixel streams: color records, runs and skip counts.

use fbcodec_frame::{pack_rgb, unpack_argb, Frame};
use fbcodec_primitives::VarU15;

use crate::error::{CodecError, Result};
use crate::flags::{FormatFlags, IndexMode, RleMode};
use crate::palette::{normalize, Palette};
use crate::reader::ByteReader;
use crate::writer::ByteWriter;

/// Active flags plus the palette they index into.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct PixelFormat {
    pub flags: FormatFlags,
    pub palette: Option<Palette>,
}

impl PixelFormat {
    pub fn new(flags: FormatFlags, palette: Option<Palette>) -> Result<Self> {
        if let Some(palette) = &palette {
            let capacity = flags.index.capacity();
            if flags.index != IndexMode::Direct && palette.len() > capacity {
                return Err(CodecError::PaletteOverflow {
                    len: palette.len(),
                    capacity,
                });
            }
        }
        Ok(Self { flags, palette })
    }

    /// The palette to write into a header table, if the flags index into one.
    pub fn table_palette(&self) -> Option<&Palette> {
        match self.flags.index {
            IndexMode::Direct => None,
            _ => self.palette.as_ref(),
        }
    }

    fn index(&self, color: u32) -> Result<u16> {
        self.palette
            .as_ref()
            .and_then(|palette| palette.index_of(color))
            .ok_or(CodecError::ColorNotInPalette(color))
    }

    /// Bytes one color record takes. Colors missing from the palette are
    /// costed as the widest record; writing them fails later.
    pub fn color_len(&self, color: u32) -> usize {
        match self.flags.index {
            IndexMode::Direct if self.flags.opaque => 3,
            IndexMode::Direct => 4,
            IndexMode::Index8 => 1,
            IndexMode::Index15 => self.index(color).map_or(2, VarU15::len_of),
        }
    }

    pub fn write_color(&self, writer: &mut ByteWriter, color: u32) -> Result<()> {
        match self.flags.index {
            IndexMode::Direct if self.flags.opaque => {
                let [_, r, g, b] = unpack_argb(color);
                writer.put_u8(r);
                writer.put_u8(g);
                writer.put_u8(b);
            }
            IndexMode::Direct => writer.put_u32(color),
            IndexMode::Index8 => writer.put_u8(self.index(color)? as u8),
            IndexMode::Index15 => writer.put(&VarU15::new(self.index(color)?)?),
        }
        Ok(())
    }

    pub fn read_color(&self, reader: &mut ByteReader<'_>) -> Result<u32> {
        let index = match self.flags.index {
            IndexMode::Direct if self.flags.opaque => {
                let r = reader.read_u8()?;
                let g = reader.read_u8()?;
                let b = reader.read_u8()?;
                return Ok(pack_rgb(r, g, b));
            }
            IndexMode::Direct => return reader.read_u32(),
            IndexMode::Index8 => u16::from(reader.read_u8()?),
            IndexMode::Index15 => reader.read::<VarU15>()?.get(),
        };
        self.palette
            .as_ref()
            .and_then(|palette| palette.color_at(index))
            .ok_or(CodecError::PaletteMiss(index))
    }

    fn runs<'a, F: Frame>(&self, current: &'a F, previous: Option<&'a F>) -> Runs<'a, F> {
        Runs {
            current,
            previous: previous.filter(|_| self.flags.change_only.is_some()),
            opaque: self.flags.opaque,
            merge: self.flags.rle != RleMode::None,
            pos: 0,
        }
    }

    /// Write the pixel stream of `current`. Skip counts are written only when
    /// the flags select change-only mode and a `previous` frame is given.
    pub fn write_body<F: Frame>(
        &self,
        writer: &mut ByteWriter,
        current: &F,
        previous: Option<&F>,
    ) -> Result<()> {
        let skip = previous.and(self.flags.change_only).map(|mode| mode.counter());
        let rle = self.flags.rle.counter();
        for run in self.runs(current, previous) {
            if let Some(counter) = skip {
                counter.write(writer, run.skip)?;
            }
            if let Some(counter) = rle {
                counter.write(writer, run.len - 1)?;
            }
            self.write_color(writer, run.color)?;
        }
        Ok(())
    }

    /// Bytes [`PixelFormat::write_body`] would write.
    pub fn body_len<F: Frame>(&self, current: &F, previous: Option<&F>) -> usize {
        let skip = previous.and(self.flags.change_only).map(|mode| mode.counter());
        let rle = self.flags.rle.counter();
        self.runs(current, previous)
            .map(|run| {
                skip.map_or(0, |c| c.encoded_len(run.skip))
                    + rle.map_or(0, |c| c.encoded_len(run.len - 1))
                    + self.color_len(run.color)
            })
            .sum()
    }

    /// Apply a pixel stream ending at `end` to `frame`.
    ///
    /// With `delta` set every run is preceded by a skip count and pixels not
    /// covered keep the value `frame` was seeded with.
    pub fn read_body<F: Frame>(
        &self,
        reader: &mut ByteReader<'_>,
        end: usize,
        frame: &mut F,
        delta: bool,
    ) -> Result<()> {
        let pixels = frame.pixel_count();
        let skip = self
            .flags
            .change_only
            .filter(|_| delta)
            .map(|mode| mode.counter());
        let rle = self.flags.rle.counter();

        let mut index = 0usize;
        while reader.position() < end && index < pixels {
            if let Some(counter) = skip {
                let count = counter.read(reader)?;
                if count > pixels - index {
                    return Err(CodecError::PixelOverrun {
                        index,
                        count,
                        pixels,
                    });
                }
                index += count;
                if reader.position() >= end {
                    break;
                }
            }

            let count = match rle {
                Some(counter) => counter.read(reader)?.saturating_add(1),
                None => 1,
            };
            if count > pixels - index {
                return Err(CodecError::PixelOverrun {
                    index,
                    count,
                    pixels,
                });
            }
            let color = self.read_color(reader)?;
            for i in index..index + count {
                frame.set_color_indexed(i, color);
            }
            index += count;
        }

        if index < pixels && skip.is_none() {
            tracing::warn!(
                decoded = index,
                pixels,
                "pixel stream ended before the last pixel"
            );
        }
        Ok(())
    }
}

/// A maximal run of one color, preceded by `skip` unchanged pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Run {
    skip: usize,
    color: u32,
    len: usize,
}

/// Splits a frame into [`Run`]s. Unchanged pixels end a run; identical
/// neighbors merge only when `merge` is set.
struct Runs<'a, F> {
    current: &'a F,
    previous: Option<&'a F>,
    opaque: bool,
    merge: bool,
    pos: usize,
}

impl<F: Frame> Runs<'_, F> {
    fn color(&self, index: usize) -> u32 {
        normalize(self.current.color_indexed(index), self.opaque)
    }

    fn unchanged(&self, index: usize) -> bool {
        self.previous.is_some_and(|previous| {
            normalize(previous.color_indexed(index), self.opaque) == self.color(index)
        })
    }
}

impl<F: Frame> Iterator for Runs<'_, F> {
    type Item = Run;

    fn next(&mut self) -> Option<Run> {
        let pixels = self.current.pixel_count();
        let mut skip = 0;
        while self.pos < pixels && self.unchanged(self.pos) {
            skip += 1;
            self.pos += 1;
        }
        if self.pos >= pixels {
            return None;
        }

        let color = self.color(self.pos);
        let mut len = 1;
        self.pos += 1;
        if self.merge {
            while self.pos < pixels && self.color(self.pos) == color && !self.unchanged(self.pos) {
                len += 1;
                self.pos += 1;
            }
        }
        Some(Run { skip, color, len })
    }
}

/// Pick the RLE mode with the smallest cost. Ties keep the earlier
/// candidate in `none, rle8, rle15, rle16` order.
pub(crate) fn choose_rle(mut cost: impl FnMut(RleMode) -> Result<usize>) -> Result<RleMode> {
    let mut best = RleMode::None;
    let mut best_cost = cost(RleMode::None)?;
    for mode in [RleMode::Rle8, RleMode::Rle15, RleMode::Rle16] {
        let candidate = cost(mode)?;
        tracing::trace!(mode = mode.name(), cost = candidate, "rle candidate");
        if candidate < best_cost {
            best = mode;
            best_cost = candidate;
        }
    }
    Ok(best)
}
