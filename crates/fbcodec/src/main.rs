mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "fbcodec", version, about = "Frame buffer codec CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{RleArg, SkipArg};

    #[test]
    fn parses_transcode_options() {
        let cli = Cli::try_parse_from([
            "fbcodec",
            "transcode",
            "in.fbs",
            "out.fbs",
            "--rle",
            "rle15",
            "--indexed",
            "--change-only",
            "co16",
        ])
        .expect("transcode args should parse");

        match cli.command {
            Command::Transcode(args) => {
                assert_eq!(args.rle, RleArg::Rle15);
                assert!(args.indexed);
                assert!(!args.opaque);
                assert_eq!(args.change_only, Some(SkipArg::Co16));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rle_defaults_to_auto() {
        let cli = Cli::try_parse_from(["fbcodec", "transcode", "a", "b"])
            .expect("transcode args should parse");
        assert!(matches!(
            cli.command,
            Command::Transcode(ref args) if args.rle == RleArg::Auto
        ));
    }

    #[test]
    fn rejects_unknown_rle_mode() {
        let err = Cli::try_parse_from(["fbcodec", "transcode", "a", "b", "--rle", "rle32"])
            .expect_err("unknown rle mode should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn parses_inspect_with_global_format() {
        let cli = Cli::try_parse_from(["fbcodec", "inspect", "x.fbb", "--format", "json"])
            .expect("inspect args should parse");
        assert!(matches!(cli.command, Command::Inspect(_)));
        assert!(matches!(cli.format, Some(OutputFormat::Json)));
    }
}
