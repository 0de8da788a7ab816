use clap::{Args, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use fbcodec_codec::{RleMode, SkipMode};

use crate::exit::{io_error, CliResult};
use crate::output::OutputFormat;

pub mod inspect;
pub mod transcode;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the header of a frame buffer or sequence file.
    Inspect(InspectArgs),
    /// Decode a file and re-encode it with other compression options.
    Transcode(TranscodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Inspect(args) => inspect::run(args, format),
        Command::Transcode(args) => transcode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

pub(crate) fn read_input(path: &Path) -> CliResult<Vec<u8>> {
    std::fs::read(path).map_err(|err| io_error(&format!("read {}", path.display()), err))
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// File to inspect.
    pub path: PathBuf,
}

/// Run-length mode, or `auto` to pick the smallest.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum RleArg {
    None,
    Rle8,
    Rle16,
    Rle15,
    Auto,
}

impl RleArg {
    pub fn mode(self) -> Option<RleMode> {
        match self {
            RleArg::None => Some(RleMode::None),
            RleArg::Rle8 => Some(RleMode::Rle8),
            RleArg::Rle16 => Some(RleMode::Rle16),
            RleArg::Rle15 => Some(RleMode::Rle15),
            RleArg::Auto => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SkipArg {
    Co8,
    Co16,
    Co15,
}

impl From<SkipArg> for SkipMode {
    fn from(arg: SkipArg) -> Self {
        match arg {
            SkipArg::Co8 => SkipMode::Co8,
            SkipArg::Co16 => SkipMode::Co16,
            SkipArg::Co15 => SkipMode::Co15,
        }
    }
}

#[derive(Args, Debug)]
pub struct TranscodeArgs {
    /// Input file (single frame or sequence).
    pub input: PathBuf,
    /// Output file.
    pub output: PathBuf,
    /// Run-length mode.
    #[arg(long, value_enum, default_value = "auto")]
    pub rle: RleArg,
    /// Drop the alpha channel.
    #[arg(long)]
    pub opaque: bool,
    /// Index colors through a palette when they fit.
    #[arg(long)]
    pub indexed: bool,
    /// Store only changed pixels of non-key frames (sequences only).
    #[arg(long, value_enum, value_name = "SKIP")]
    pub change_only: Option<SkipArg>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show build details.
    #[arg(long)]
    pub extended: bool,
}
