//! Color palettes for indexed pixel storage.

use std::collections::HashMap;

use fbcodec_frame::{pack_argb, pack_rgb, unpack_argb, Frame, OPAQUE};
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::flags::IndexMode;
use crate::reader::ByteReader;
use crate::writer::ByteWriter;

/// Ordered color table; a color's index is its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<u32>,
    lookup: HashMap<u32, u16>,
}

impl Palette {
    /// Most colors any index mode can address.
    pub const MAX_LEN: usize = 0x7FFF;

    pub fn new() -> Self {
        Self::default()
    }

    /// Build a palette in the given order. Repeated colors keep their
    /// first index for lookups.
    pub fn from_colors(colors: impl IntoIterator<Item = u32>) -> Result<Self> {
        let mut palette = Self::new();
        for color in colors {
            palette.push(color)?;
        }
        Ok(palette)
    }

    /// Greedy palette over every pixel of `frames` in scan order.
    ///
    /// Returns `None` once more than [`Palette::MAX_LEN`] distinct colors
    /// are seen. With `opaque`, colors are stored with full alpha.
    pub fn scan<'a, F: Frame + 'a>(
        frames: impl IntoIterator<Item = &'a F>,
        opaque: bool,
    ) -> Option<Self> {
        let mut palette = Self::new();
        for frame in frames {
            for i in 0..frame.pixel_count() {
                let color = normalize(frame.color_indexed(i), opaque);
                if palette.lookup.contains_key(&color) {
                    continue;
                }
                if palette.push(color).is_err() {
                    debug!(
                        limit = Self::MAX_LEN,
                        "too many distinct colors for an indexed palette"
                    );
                    return None;
                }
            }
        }
        Some(palette)
    }

    /// Append a color, returning its index.
    pub fn push(&mut self, color: u32) -> Result<u16> {
        if self.colors.len() >= Self::MAX_LEN {
            return Err(CodecError::PaletteOverflow {
                len: self.colors.len() + 1,
                capacity: Self::MAX_LEN,
            });
        }
        let index = self.colors.len() as u16;
        self.colors.push(color);
        self.lookup.entry(color).or_insert(index);
        Ok(index)
    }

    /// Index of `color`, appending it if absent.
    pub fn insert(&mut self, color: u32) -> Result<u16> {
        match self.lookup.get(&color) {
            Some(index) => Ok(*index),
            None => self.push(color),
        }
    }

    pub fn index_of(&self, color: u32) -> Option<u16> {
        self.lookup.get(&color).copied()
    }

    pub fn color_at(&self, index: u16) -> Option<u32> {
        self.colors.get(usize::from(index)).copied()
    }

    pub fn contains(&self, color: u32) -> bool {
        self.lookup.contains_key(&color)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn colors(&self) -> &[u32] {
        &self.colors
    }

    /// Narrowest index mode addressing the whole palette.
    pub fn index_mode(&self) -> IndexMode {
        IndexMode::for_palette_len(self.len()).unwrap_or(IndexMode::Index15)
    }

    /// The same palette with every color forced opaque.
    pub(crate) fn normalized(&self, opaque: bool) -> Self {
        if !opaque {
            return self.clone();
        }
        let mut palette = Self::new();
        for color in &self.colors {
            let index = palette.colors.len() as u16;
            palette.colors.push(color | OPAQUE);
            palette.lookup.entry(color | OPAQUE).or_insert(index);
        }
        palette
    }

    /// Write the records of a palette header entry: ARGB, or RGB when opaque.
    pub(crate) fn write_records(&self, writer: &mut ByteWriter, opaque: bool) {
        for color in &self.colors {
            let [a, r, g, b] = unpack_argb(*color);
            if !opaque {
                writer.put_u8(a);
            }
            writer.put_u8(r);
            writer.put_u8(g);
            writer.put_u8(b);
        }
    }

    /// Read `count` palette records.
    pub(crate) fn read_records(
        reader: &mut ByteReader<'_>,
        count: usize,
        opaque: bool,
    ) -> Result<Self> {
        if count > Self::MAX_LEN {
            return Err(CodecError::PaletteOverflow {
                len: count,
                capacity: Self::MAX_LEN,
            });
        }
        let mut palette = Self::new();
        for _ in 0..count {
            let color = if opaque {
                let r = reader.read_u8()?;
                let g = reader.read_u8()?;
                let b = reader.read_u8()?;
                pack_rgb(r, g, b)
            } else {
                let a = reader.read_u8()?;
                let r = reader.read_u8()?;
                let g = reader.read_u8()?;
                let b = reader.read_u8()?;
                pack_argb(a, r, g, b)
            };
            palette.push(color)?;
        }
        Ok(palette)
    }
}

/// The color a pixel is stored as: full alpha when `opaque`.
pub(crate) fn normalize(color: u32, opaque: bool) -> u32 {
    if opaque {
        color | OPAQUE
    } else {
        color
    }
}
