//! Single-frame codec (`"fbb "` containers).
//!
//! The data section is `dataLen:u32` followed by the pixel stream.

use bytes::Bytes;
use fbcodec_frame::Frame;
use tracing::{debug, warn};

use crate::config::{DecoderConfig, EncodeOptions};
use crate::error::Result;
use crate::flags::{FormatFlags, IndexMode, RleMode};
use crate::header::{self, ContainerKind, Header};
use crate::palette::Palette;
use crate::pixels::{choose_rle, PixelFormat};
use crate::reader::ByteReader;
use crate::writer::ByteWriter;

/// Encodes one frame.
///
/// ```
/// use fbcodec_codec::single::{Decoder, Encoder};
/// use fbcodec_frame::ArgbFrame;
///
/// let frame = ArgbFrame::filled(8, 8, 0xFF20_4060);
/// let mut encoder = Encoder::new(&frame);
/// encoder.optimize().unwrap();
/// let bytes = encoder.encode().unwrap();
///
/// let decoded: ArgbFrame = Decoder::new().decode(&bytes).unwrap();
/// assert_eq!(decoded, frame);
/// ```
#[derive(Debug, Clone)]
pub struct Encoder<'f, F: Frame> {
    frame: &'f F,
    rle: RleMode,
    opaque: bool,
    palette: Option<Palette>,
}

impl<'f, F: Frame> Encoder<'f, F> {
    pub fn new(frame: &'f F) -> Self {
        Self::with_options(frame, EncodeOptions::default())
    }

    /// `options.change_only` has no meaning for a single frame and is ignored.
    pub fn with_options(frame: &'f F, options: EncodeOptions) -> Self {
        Self {
            frame,
            rle: options.rle,
            opaque: options.opaque,
            palette: None,
        }
    }

    pub fn rle(&self) -> RleMode {
        self.rle
    }

    pub fn set_rle(&mut self, rle: RleMode) {
        self.rle = rle;
    }

    pub fn opaque(&self) -> bool {
        self.opaque
    }

    pub fn set_opaque(&mut self, opaque: bool) {
        self.opaque = opaque;
    }

    pub fn palette(&self) -> Option<&Palette> {
        self.palette.as_ref()
    }

    /// Index colors through `palette`, or write them directly with `None`.
    /// Encoding fails if the frame uses a color the palette lacks.
    pub fn set_palette(&mut self, palette: Option<Palette>) {
        self.palette = palette;
    }

    pub fn index_mode(&self) -> IndexMode {
        self.palette
            .as_ref()
            .map_or(IndexMode::Direct, Palette::index_mode)
    }

    /// Build a palette from the frame's colors. Returns `false` and leaves
    /// the encoder unindexed when there are too many distinct colors.
    pub fn try_indexed(&mut self) -> bool {
        self.palette = Palette::scan([self.frame], self.opaque);
        self.palette.is_some()
    }

    /// Select the RLE mode with the smallest pixel stream.
    pub fn try_rle(&mut self) -> Result<RleMode> {
        let rle = choose_rle(|rle| Ok(self.format(rle)?.body_len(self.frame, None)))?;
        debug!(rle = rle.name(), "selected run-length mode");
        self.rle = rle;
        Ok(rle)
    }

    /// [`Encoder::try_indexed`] followed by [`Encoder::try_rle`].
    pub fn optimize(&mut self) -> Result<()> {
        self.try_indexed();
        self.try_rle()?;
        Ok(())
    }

    fn format(&self, rle: RleMode) -> Result<PixelFormat> {
        let flags = FormatFlags {
            rle,
            opaque: self.opaque,
            index: self.index_mode(),
            change_only: None,
        };
        let palette = self.palette.as_ref().map(|p| p.normalized(self.opaque));
        PixelFormat::new(flags, palette)
    }

    pub fn encode(&self) -> Result<Bytes> {
        let (width, height) = header::dimensions(self.frame.width(), self.frame.height())?;
        let format = self.format(self.rle)?;
        let header = Header {
            kind: ContainerKind::Single,
            width,
            height,
            flags: format.flags,
            frame_count: 0,
        };

        let mut writer = ByteWriter::new();
        header::write_header(&mut writer, &header, &format)?;

        let length_at = writer.position();
        writer.put_u32(0);
        format.write_body(&mut writer, self.frame, None)?;
        let data_len = writer.position() - length_at - 4;
        writer.patch_u32(length_at, header::to_u32(data_len, "data length")?);

        debug!(
            width,
            height,
            flags = %format.flags,
            bytes = writer.position(),
            "encoded frame"
        );
        Ok(writer.freeze())
    }
}

/// Decodes single-frame containers.
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
    used_bytes: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            config,
            used_bytes: 0,
        }
    }

    /// Offset just past the data section of the last decoded frame.
    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn decode<F: Frame>(&mut self, bytes: &[u8]) -> Result<F> {
        let mut reader = ByteReader::new(bytes);
        let header = header::read_header(&mut reader, ContainerKind::Single)?;
        self.config.check_pixels(header.width, header.height)?;

        reader.seek(header.data_pointer);
        let data_len = reader.read_u32()? as usize;
        let start = reader.position();
        reader.require(data_len)?;
        let end = start + data_len;

        let mut frame = F::blank(header.width, header.height);
        header
            .format
            .read_body(&mut reader, end, &mut frame, false)?;

        if reader.position() != end {
            warn!(
                consumed = reader.position() - start,
                declared = data_len,
                "data section not exactly consumed"
            );
        }
        self.used_bytes = end;
        Ok(frame)
    }
}

/// Encode `frame` with fixed options.
pub fn encode_frame<F: Frame>(frame: &F, options: EncodeOptions) -> Result<Bytes> {
    Encoder::with_options(frame, options).encode()
}

/// Decode a single-frame container with the default limits.
pub fn decode_frame<F: Frame>(bytes: &[u8]) -> Result<F> {
    Decoder::new().decode(bytes)
}

#[cfg(test)]
mod tests {
    use fbcodec_frame::ArgbFrame;

    use super::*;
    use crate::error::CodecError;

    fn gradient(width: usize, height: usize) -> ArgbFrame {
        let pixels = (0..width * height)
            .map(|i| 0xFF00_0000 | (i as u32 / 3))
            .collect();
        ArgbFrame::from_pixels(width, height, pixels).unwrap()
    }

    #[test]
    fn direct_encoding_layout() {
        let frame = ArgbFrame::from_pixels(2, 1, vec![0x0102_0304, 0x0506_0708]).unwrap();
        let bytes = Encoder::new(&frame).encode().unwrap();
        assert_eq!(&bytes[..4], b"fbb ");
        assert_eq!(&bytes[4..8], &[0, 0, 0, 18]);
        assert_eq!(&bytes[18..22], &[0, 0, 0, 8]);
        assert_eq!(&bytes[22..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn optimized_roundtrip() {
        let frame = gradient(17, 5);
        let mut encoder = Encoder::new(&frame);
        encoder.optimize().unwrap();
        assert_eq!(encoder.index_mode(), IndexMode::Index8);
        assert_ne!(encoder.rle(), RleMode::None);

        let bytes = encoder.encode().unwrap();
        let mut decoder = Decoder::new();
        let decoded: ArgbFrame = decoder.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoder.used_bytes(), bytes.len());
    }

    #[test]
    fn used_bytes_stops_at_data_end() {
        let frame = gradient(4, 4);
        let mut bytes = Encoder::new(&frame).encode().unwrap().to_vec();
        let len = bytes.len();
        bytes.extend_from_slice(b"trailing");

        let mut decoder = Decoder::new();
        let decoded: ArgbFrame = decoder.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoder.used_bytes(), len);
    }

    #[test]
    fn oversized_data_length_clamps_to_declared_end() {
        let frame = gradient(4, 4);
        let mut bytes = Encoder::new(&frame).encode().unwrap().to_vec();
        let pointer = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
        let declared = u32::from_be_bytes([
            bytes[pointer],
            bytes[pointer + 1],
            bytes[pointer + 2],
            bytes[pointer + 3],
        ]);
        bytes[pointer..pointer + 4].copy_from_slice(&(declared + 4).to_be_bytes());
        bytes.extend_from_slice(&[0xAA; 4]);
        bytes.extend_from_slice(b"next");

        let mut decoder = Decoder::new();
        let decoded: ArgbFrame = decoder.decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
        assert_eq!(decoder.used_bytes(), bytes.len() - 4);
    }

    #[test]
    fn try_rle_picks_none_for_noise() {
        let pixels = (0..64u32).map(|i| i.wrapping_mul(2_654_435_761)).collect();
        let frame = ArgbFrame::from_pixels(8, 8, pixels).unwrap();
        let mut encoder = Encoder::new(&frame);
        assert_eq!(encoder.try_rle().unwrap(), RleMode::None);
    }

    #[test]
    fn try_rle_picks_rle8_for_short_runs() {
        let frame = ArgbFrame::filled(10, 10, 0xFF00_00FF);
        let mut encoder = Encoder::new(&frame);
        // rle8 and rle15 both need one counter byte per 100-pixel run
        assert_eq!(encoder.try_rle().unwrap(), RleMode::Rle8);
    }

    #[test]
    fn opaque_drops_alpha() {
        let frame = ArgbFrame::from_pixels(2, 1, vec![0x00FF_0000, 0x80FF_0000]).unwrap();
        let mut encoder = Encoder::new(&frame);
        encoder.set_opaque(true);
        let decoded: ArgbFrame = decode_frame(&encoder.encode().unwrap()).unwrap();
        assert_eq!(decoded.pixels(), &[0xFFFF_0000, 0xFFFF_0000]);
    }

    #[test]
    fn explicit_palette_must_cover_frame() {
        let frame = ArgbFrame::from_pixels(2, 1, vec![1, 2]).unwrap();
        let mut encoder = Encoder::new(&frame);
        encoder.set_palette(Some(Palette::from_colors([1]).unwrap()));
        let err = encoder.encode().unwrap_err();
        assert!(matches!(err, CodecError::ColorNotInPalette(2)));
    }

    #[test]
    fn too_many_colors_leaves_encoder_direct() {
        let pixels = (0..=Palette::MAX_LEN as u32).collect();
        let frame = ArgbFrame::from_pixels(Palette::MAX_LEN + 1, 1, pixels).unwrap();
        let mut encoder = Encoder::new(&frame);
        assert!(!encoder.try_indexed());
        assert!(encoder.palette().is_none());
        assert_eq!(encoder.index_mode(), IndexMode::Direct);
    }

    #[test]
    fn oversized_frames_are_rejected() {
        let frame = ArgbFrame::new(70_000, 1);
        let err = Encoder::new(&frame).encode().unwrap_err();
        assert!(matches!(err, CodecError::Dimensions { width: 70_000, .. }));
    }

    #[test]
    fn decoder_enforces_pixel_limit() {
        let frame = ArgbFrame::new(20, 20);
        let bytes = Encoder::new(&frame).encode().unwrap();
        let mut decoder = Decoder::with_config(DecoderConfig {
            max_pixels: 100,
            ..DecoderConfig::default()
        });
        let err = decoder.decode::<ArgbFrame>(&bytes).unwrap_err();
        assert!(matches!(err, CodecError::LimitExceeded { .. }));
    }

    #[test]
    fn truncated_data_is_bounds_error() {
        let frame = gradient(4, 4);
        let bytes = Encoder::new(&frame).encode().unwrap();
        let err = decode_frame::<ArgbFrame>(&bytes[..bytes.len() - 1]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Bounds);
    }
}
