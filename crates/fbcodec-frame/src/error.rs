/// Errors raised by frame construction and coordinate access.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The pixel store does not hold `width * height` colors.
    #[error("pixel count {actual} does not match {width}x{height}")]
    SizeMismatch {
        width: usize,
        height: usize,
        actual: usize,
    },

    /// A coordinate lies outside the frame.
    #[error("point ({x},{y}) outside frame {width}x{height}")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
}

pub type Result<T> = std::result::Result<T, FrameError>;
