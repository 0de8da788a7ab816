use fbcodec_codec::{
    decode_frame, decode_sequence, encode_frame, encode_sequence, CodecError, DecoderConfig,
    EncodeOptions, ErrorKind, Encoder, IndexMode, Palette, SequenceDecoder,
};
use fbcodec_frame::ArgbFrame;

fn indexed_frame() -> (ArgbFrame, Vec<u8>) {
    let frame = ArgbFrame::from_pixels(3, 1, vec![0xFF00_0001, 0xFF00_0002, 0xFF00_0003]).unwrap();
    let mut encoder = Encoder::new(&frame);
    assert!(encoder.try_indexed());
    assert_eq!(encoder.index_mode(), IndexMode::Index8);
    (frame.clone(), encoder.encode().unwrap().to_vec())
}

#[test]
fn bad_tag_is_format_error() {
    let frame = ArgbFrame::filled(2, 2, 0xFF00_0000);
    let mut bytes = encode_frame(&frame, EncodeOptions::default()).unwrap().to_vec();
    bytes[0] = b'x';
    let err = decode_frame::<ArgbFrame>(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::InvalidTag { .. }));
    assert_eq!(err.kind(), ErrorKind::Format);

    // a single-frame buffer is not a sequence
    let bytes = encode_frame(&frame, EncodeOptions::default()).unwrap();
    assert!(matches!(
        decode_sequence::<ArgbFrame>(&bytes),
        Err(CodecError::InvalidTag { expected: "fbs", .. })
    ));
}

#[test]
fn duplicate_palette_entry_is_rejected() {
    let (_, bytes) = indexed_frame();
    // header(16) | palette entry: type, count, 3 ARGB records (16 bytes)
    let entry = bytes[16..32].to_vec();
    let mut doubled = bytes[..32].to_vec();
    doubled.extend_from_slice(&entry);
    doubled.extend_from_slice(&bytes[32..]);
    let pointer = u32::from_be_bytes(doubled[4..8].try_into().unwrap()) + entry.len() as u32;
    doubled[4..8].copy_from_slice(&pointer.to_be_bytes());

    let err = decode_frame::<ArgbFrame>(&doubled).unwrap_err();
    assert!(matches!(err, CodecError::DuplicateEntry(1)));
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn undefined_palette_index_is_a_miss() {
    let (_, mut bytes) = indexed_frame();
    let last = bytes.len() - 1;
    bytes[last] = 9;
    let err = decode_frame::<ArgbFrame>(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::PaletteMiss(9)));
}

#[test]
fn truncation_anywhere_is_an_error() {
    let (_, bytes) = indexed_frame();
    for len in 0..bytes.len() {
        let err = decode_frame::<ArgbFrame>(&bytes[..len]).unwrap_err();
        assert!(
            matches!(err.kind(), ErrorKind::Bounds | ErrorKind::Format),
            "truncated to {len}: {err}"
        );
    }
}

#[test]
fn truncated_sequence_is_bounds_error() {
    let frames = vec![ArgbFrame::filled(4, 4, 1), ArgbFrame::filled(4, 4, 2)];
    let bytes = encode_sequence(&frames, EncodeOptions::default()).unwrap();
    let err = decode_sequence::<ArgbFrame>(&bytes[..bytes.len() - 3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Bounds);
}

#[test]
fn color_outside_explicit_palette_is_contract_error() {
    let frame = ArgbFrame::from_pixels(2, 1, vec![1, 2]).unwrap();
    let mut encoder = Encoder::new(&frame);
    encoder.set_palette(Some(Palette::from_colors([2]).unwrap()));
    let err = encoder.encode().unwrap_err();
    assert!(matches!(err, CodecError::ColorNotInPalette(1)));
    assert_eq!(err.kind(), ErrorKind::Contract);
}

#[test]
fn frame_limit_applies_to_declared_count() {
    let frames = vec![ArgbFrame::filled(1, 1, 1); 10];
    let bytes = encode_sequence(&frames, EncodeOptions::default()).unwrap();
    let mut decoder = SequenceDecoder::with_config(DecoderConfig {
        max_frames: 4,
        ..DecoderConfig::default()
    });
    let err = decoder.decode::<ArgbFrame>(&bytes).unwrap_err();
    assert!(matches!(err, CodecError::LimitExceeded { value: 10, limit: 4, .. }));
}
