//! Packing helpers for 32-bit ARGB colors (8 bits per channel).

/// Alpha channel fully set.
pub const OPAQUE: u32 = 0xFF00_0000;

/// Pack an opaque color.
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    OPAQUE | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

pub const fn pack_argb(a: u8, r: u8, g: u8, b: u8) -> u32 {
    (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
}

/// Split a color into `[a, r, g, b]`.
pub const fn unpack_argb(color: u32) -> [u8; 4] {
    color.to_be_bytes()
}
