use fbcodec_codec::{inspect, HeaderInfo};

use crate::cmd::{read_input, InspectArgs};
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{optional, print_json, print_pretty, print_table, OutputFormat};

pub fn run(args: InspectArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = read_input(&args.path)?;
    let info = inspect(&bytes).map_err(|err| codec_error("inspect failed", err))?;
    tracing::debug!(path = %args.path.display(), bytes = bytes.len(), "inspected");

    match format {
        OutputFormat::Json => print_json(&info),
        OutputFormat::Table => print_table(&rows(&info, bytes.len())),
        OutputFormat::Pretty => print_pretty("Header", &rows(&info, bytes.len())),
        OutputFormat::Raw => println!("{}", kind_name(&info)),
    }
    Ok(SUCCESS)
}

fn kind_name(info: &HeaderInfo) -> &'static str {
    match info.kind {
        fbcodec_codec::ContainerKind::Single => "single",
        fbcodec_codec::ContainerKind::Sequence if info.open_ended => "stream",
        fbcodec_codec::ContainerKind::Sequence => "sequence",
    }
}

fn rows(info: &HeaderInfo, file_len: usize) -> Vec<(&'static str, String)> {
    let flags = if info.flags.is_empty() {
        "none".to_string()
    } else {
        info.flags.join(",")
    };
    vec![
        ("kind", kind_name(info).to_string()),
        ("size", format!("{}x{}", info.width, info.height)),
        ("flags", format!("{flags} ({:#04x})", info.flag_bits)),
        ("rle", info.rle.to_string()),
        ("palette", optional(info.palette_len)),
        ("frames", optional(info.frame_count)),
        ("records", optional(info.records_defined)),
        ("data pointer", info.data_pointer.to_string()),
        ("data length", optional(info.data_length)),
        ("file size", file_len.to_string()),
    ]
}
