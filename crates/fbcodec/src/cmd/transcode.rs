use fbcodec_codec::{
    CodecError, ContainerKind, Decoder, EncodeOptions, Encoder, Result, SequenceDecoder,
    SequenceEncoder, StreamDecoder,
};
use fbcodec_frame::ArgbFrame;
use serde::Serialize;

use crate::cmd::{read_input, RleArg, TranscodeArgs};
use crate::exit::{codec_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{optional, print_json, print_pretty, print_table, OutputFormat};

#[derive(Serialize)]
struct TranscodeOutput {
    kind: ContainerKind,
    frames: usize,
    input_bytes: usize,
    output_bytes: usize,
    flags: Vec<&'static str>,
    palette_len: Option<usize>,
}

pub fn run(args: TranscodeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.input == args.output {
        return Err(CliError::new(USAGE, "output path must differ from input path"));
    }
    let bytes = read_input(&args.input)?;
    let kind = fbcodec_codec::sniff(&bytes).ok_or_else(|| {
        CliError::new(
            DATA_INVALID,
            format!("{}: not a frame buffer file", args.input.display()),
        )
    })?;

    let (frames, encoded) = match kind {
        ContainerKind::Single => transcode_single(&args, &bytes),
        ContainerKind::Sequence => transcode_sequence(&args, &bytes),
    }
    .map_err(|err| codec_error("transcode failed", err))?;

    std::fs::write(&args.output, &encoded)
        .map_err(|err| io_error(&format!("write {}", args.output.display()), err))?;

    let info = fbcodec_codec::inspect(&encoded).map_err(|err| codec_error("re-read failed", err))?;
    let report = TranscodeOutput {
        kind,
        frames,
        input_bytes: bytes.len(),
        output_bytes: encoded.len(),
        flags: info.flags,
        palette_len: info.palette_len,
    };
    print_report(&report, format);
    Ok(SUCCESS)
}

fn options(args: &TranscodeArgs) -> EncodeOptions {
    EncodeOptions {
        rle: args.rle.mode().unwrap_or_default(),
        opaque: args.opaque,
        change_only: args.change_only.map(Into::into),
    }
}

fn transcode_single(args: &TranscodeArgs, bytes: &[u8]) -> Result<(usize, Vec<u8>)> {
    if args.change_only.is_some() {
        tracing::warn!("--change-only has no effect on a single frame");
    }
    let frame: ArgbFrame = Decoder::new().decode(bytes)?;
    let mut encoder = Encoder::with_options(&frame, options(args));
    if args.indexed && !encoder.try_indexed() {
        tracing::warn!("too many colors to index, writing direct colors");
    }
    if args.rle == RleArg::Auto {
        encoder.try_rle()?;
    }
    Ok((1, encoder.encode()?.to_vec()))
}

fn transcode_sequence(args: &TranscodeArgs, bytes: &[u8]) -> Result<(usize, Vec<u8>)> {
    let frames = match SequenceDecoder::new().decode::<ArgbFrame>(bytes) {
        Err(CodecError::OpenEndedStream) => {
            // a stored stream is one record-aligned chunk
            let mut decoder = StreamDecoder::<ArgbFrame>::new();
            let frames = decoder.decode_chunk(bytes)?;
            if !decoder.closed() {
                tracing::warn!("stream has no end record");
            }
            frames
        }
        other => other?,
    };

    let mut encoder = SequenceEncoder::with_options(&frames, options(args));
    if args.indexed && !encoder.try_indexed() {
        tracing::warn!("too many colors to index, writing direct colors");
    }
    if args.rle == RleArg::Auto {
        encoder.try_rle()?;
    }
    Ok((frames.len(), encoder.encode()?.to_vec()))
}

fn print_report(report: &TranscodeOutput, format: OutputFormat) {
    let flags = if report.flags.is_empty() {
        "none".to_string()
    } else {
        report.flags.join(",")
    };
    let rows = [
        ("frames", report.frames.to_string()),
        ("input bytes", report.input_bytes.to_string()),
        ("output bytes", report.output_bytes.to_string()),
        ("flags", flags),
        ("palette", optional(report.palette_len)),
    ];
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Pretty => print_pretty("Transcoded", &rows),
        OutputFormat::Raw => println!("{}", report.output_bytes),
    }
}
