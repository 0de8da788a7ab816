use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};
use crate::flags::{RleMode, SkipMode};

/// Default decoder pixel limit: 4096x4096.
pub const DEFAULT_MAX_PIXELS: usize = 4096 * 4096;

/// Default decoder frame limit: every count a finite sequence can declare.
pub const DEFAULT_MAX_FRAMES: usize = 0xFFFE;

/// Compression choices shared by every encoder.
///
/// Indexing is not an option here: it is enabled by giving an encoder a
/// palette or by asking it to `try_indexed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Run-length counter width.
    pub rle: RleMode,
    /// Drop the alpha channel; every color is treated as fully opaque.
    pub opaque: bool,
    /// Write non-key frames as deltas with this skip-count width.
    /// Ignored by the single-frame encoder.
    pub change_only: Option<SkipMode>,
}

/// Bounds on what a decoder will allocate for untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Maximum `width * height` of a decoded frame.
    pub max_pixels: usize,
    /// Maximum number of frames a sequence may declare.
    pub max_frames: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_pixels: DEFAULT_MAX_PIXELS,
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }
}

impl DecoderConfig {
    /// Pixel count of a `width` x `height` frame, if within `max_pixels`.
    pub(crate) fn check_pixels(&self, width: usize, height: usize) -> Result<usize> {
        let pixels = width * height;
        if pixels > self.max_pixels {
            return Err(CodecError::LimitExceeded {
                what: "pixel count",
                value: pixels,
                limit: self.max_pixels,
            });
        }
        Ok(pixels)
    }

    pub(crate) fn check_frames(&self, frames: usize) -> Result<()> {
        if frames > self.max_frames {
            return Err(CodecError::LimitExceeded {
                what: "frame count",
                value: frames,
                limit: self.max_frames,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_with_defaults() {
        let options: EncodeOptions =
            serde_json::from_str(r#"{"rle":"rle15","change_only":"co16"}"#).unwrap();
        assert_eq!(options.rle, RleMode::Rle15);
        assert!(!options.opaque);
        assert_eq!(options.change_only, Some(SkipMode::Co16));
    }

    #[test]
    fn options_serialize_lowercase() {
        let options = EncodeOptions {
            rle: RleMode::Rle8,
            opaque: true,
            change_only: None,
        };
        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(json, r#"{"rle":"rle8","opaque":true,"change_only":null}"#);
    }

    #[test]
    fn limits_are_enforced() {
        let config = DecoderConfig {
            max_pixels: 100,
            max_frames: 2,
        };
        assert_eq!(config.check_pixels(10, 10).unwrap(), 100);
        assert!(matches!(
            config.check_pixels(11, 10),
            Err(CodecError::LimitExceeded { value: 110, .. })
        ));
        assert!(config.check_frames(2).is_ok());
        assert!(config.check_frames(3).is_err());
    }
}
