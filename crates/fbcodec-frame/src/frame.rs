use crate::error::{FrameError, Result};

/// A fixed-size grid of ARGB colors addressed by row-major index
/// `x + y * width`.
///
/// Implementations must keep `width` and `height` fixed for their
/// lifetime. `Clone` is the deep copy used to seed delta frames and
/// `PartialEq` must compare every pixel.
pub trait Frame: Clone + PartialEq {
    /// A frame of the given size with every pixel set to `0`.
    fn blank(width: usize, height: usize) -> Self;

    fn width(&self) -> usize;

    fn height(&self) -> usize;

    /// Number of pixels, `width * height`.
    fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Color at a linear index.
    ///
    /// Callers guarantee `index < pixel_count()`.
    fn color_indexed(&self, index: usize) -> u32;

    /// Set the color at a linear index.
    ///
    /// Callers guarantee `index < pixel_count()`.
    fn set_color_indexed(&mut self, index: usize, color: u32);
}

/// Array-backed [`Frame`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgbFrame {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl ArgbFrame {
    /// A frame with every pixel set to `0` (transparent black).
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, 0)
    }

    /// A frame with every pixel set to `color`.
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; width * height],
        }
    }

    /// Wrap an existing row-major pixel store.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self> {
        if pixels.len() != width * height {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn into_pixels(self) -> Vec<u32> {
        self.pixels
    }

    pub fn in_frame(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    pub fn pixel(&self, x: usize, y: usize) -> Result<u32> {
        let index = self.index_of(x, y)?;
        Ok(self.pixels[index])
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32) -> Result<()> {
        let index = self.index_of(x, y)?;
        self.pixels[index] = color;
        Ok(())
    }

    fn index_of(&self, x: usize, y: usize) -> Result<usize> {
        if !self.in_frame(x, y) {
            return Err(FrameError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(x + y * self.width)
    }
}

impl Frame for ArgbFrame {
    fn blank(width: usize, height: usize) -> Self {
        Self::new(width, height)
    }

    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn pixel_count(&self) -> usize {
        self.pixels.len()
    }

    fn color_indexed(&self, index: usize) -> u32 {
        self.pixels[index]
    }

    fn set_color_indexed(&mut self, index: usize, color: u32) {
        self.pixels[index] = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_indexing() {
        let mut frame = ArgbFrame::new(3, 2);
        frame.set_pixel(1, 1, 0xFF00_00FF).unwrap();
        assert_eq!(frame.color_indexed(4), 0xFF00_00FF);
        assert_eq!(frame.pixel(1, 1).unwrap(), 0xFF00_00FF);
    }

    #[test]
    fn out_of_bounds_access() {
        let mut frame = ArgbFrame::new(2, 2);
        assert!(matches!(
            frame.set_pixel(2, 0, 1),
            Err(FrameError::OutOfBounds { x: 2, y: 0, .. })
        ));
        assert!(frame.pixel(0, 2).is_err());
    }

    #[test]
    fn from_pixels_checks_size() {
        assert!(ArgbFrame::from_pixels(2, 2, vec![0; 4]).is_ok());
        assert_eq!(
            ArgbFrame::from_pixels(2, 2, vec![0; 3]).unwrap_err(),
            FrameError::SizeMismatch {
                width: 2,
                height: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn clone_is_deep() {
        let original = ArgbFrame::filled(2, 1, 7);
        let mut copy = original.clone();
        copy.set_color_indexed(0, 9);
        assert_eq!(original.color_indexed(0), 7);
        assert_ne!(original, copy);
    }

    #[test]
    fn equality_is_element_wise() {
        let a = ArgbFrame::from_pixels(2, 1, vec![1, 2]).unwrap();
        let b = ArgbFrame::from_pixels(2, 1, vec![1, 2]).unwrap();
        let c = ArgbFrame::from_pixels(1, 2, vec![1, 2]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn blank_is_zeroed() {
        let frame = <ArgbFrame as Frame>::blank(4, 4);
        assert_eq!(frame.pixel_count(), 16);
        assert!(frame.pixels().iter().all(|c| *c == 0));
    }
}
