// clipfit-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use clipfit_core::ContainerFormat;
use clipfit_core::config::{
    DEFAULT_ENCODER_PRESET, DEFAULT_MAX_SIZE_MB, DEFAULT_QUALITY_FACTOR, MAX_QUALITY_FACTOR,
    MIN_QUALITY_FACTOR,
};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "clipfit: shrink videos until they fit a size limit",
    long_about = "Re-encodes a video with ffmpeg, lowering the bitrate until the output fits under the requested size."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging, including ffmpeg's own log lines
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Optional: Directory for a log file of this run
    #[arg(long, global = true, value_name = "LOG_DIR", env = "CLIPFIT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compresses a video to fit under a size limit
    Compress(CompressArgs),
    /// Prints duration and stream details for a video
    Probe(ProbeArgs),
    /// Saves a small JPEG preview frame from a video
    Thumbnail(ThumbnailArgs),
}

#[derive(Args, Debug)]
pub struct CompressArgs {
    /// Video file to compress
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Directory where the compressed file is written (defaults to the input's directory)
    #[arg(short = 'o', long = "output-dir", value_name = "OUTPUT_DIR", env = "CLIPFIT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Maximum output size in megabytes
    #[arg(
        short = 's',
        long = "max-size",
        value_name = "MB",
        default_value_t = DEFAULT_MAX_SIZE_MB,
        value_parser = parse_megabytes
    )]
    pub max_size_mb: f64,

    /// Encode once at constant quality instead of targeting a size.
    /// `-q` alone uses CRF 23; lower is better quality and larger.
    #[arg(
        short = 'q',
        long = "quality",
        value_name = "CRF",
        value_parser = clap::value_parser!(u8).range(MIN_QUALITY_FACTOR as i64..=MAX_QUALITY_FACTOR as i64)
    )]
    pub quality: Option<Option<u8>>,

    /// Drop all audio streams from the output
    #[arg(long, default_value_t = false)]
    pub no_audio: bool,

    /// Output container (mp4, mkv, mov, webm)
    #[arg(short = 'f', long = "format", value_name = "FORMAT", default_value_t = ContainerFormat::Mp4)]
    pub format: ContainerFormat,

    /// x264 encoder preset (ignored for webm)
    #[arg(long, value_name = "PRESET", default_value = DEFAULT_ENCODER_PRESET)]
    pub preset: String,

    /// Optional: ntfy.sh topic URL for sending notifications (e.g., https://ntfy.sh/your_topic)
    #[arg(long, value_name = "TOPIC_URL", env = "CLIPFIT_NTFY_TOPIC")]
    pub ntfy: Option<String>,

    /// Optional: Path to the ffmpeg binary
    #[arg(long, value_name = "FFMPEG_PATH", env = "CLIPFIT_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,

    /// Print the result as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl CompressArgs {
    /// Quality factor for the request, if constant-quality mode was asked for.
    pub fn quality_factor(&self) -> Option<u8> {
        self.quality
            .map(|quality| quality.unwrap_or(DEFAULT_QUALITY_FACTOR))
    }
}

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Video file to inspect
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Print the media info as JSON on stdout
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Video file to take the frame from
    #[arg(value_name = "INPUT")]
    pub input_path: PathBuf,

    /// Where to write the JPEG (defaults to `<name>-thumb.jpg` next to the input)
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Optional: Path to the ffmpeg binary
    #[arg(long, value_name = "FFMPEG_PATH", env = "CLIPFIT_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,
}

/// Parses a strictly positive, finite number of megabytes.
fn parse_megabytes(value: &str) -> Result<f64, String> {
    let mb: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if mb.is_finite() && mb > 0.0 {
        Ok(mb)
    } else {
        Err(format!("max size must be greater than zero, got {value}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_compress_defaults() {
        let cli = Cli::try_parse_from(["clipfit", "compress", "clip.mov"]).unwrap();
        match cli.command {
            Commands::Compress(args) => {
                assert_eq!(args.input_path, PathBuf::from("clip.mov"));
                assert_eq!(args.max_size_mb, DEFAULT_MAX_SIZE_MB);
                assert_eq!(args.format, ContainerFormat::Mp4);
                assert_eq!(args.preset, DEFAULT_ENCODER_PRESET);
                assert!(args.quality_factor().is_none());
                assert!(!args.no_audio);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(!cli.verbose);
    }

    #[test]
    fn test_compress_options() {
        let cli = Cli::try_parse_from([
            "clipfit", "compress", "clip.mkv", "-s", "25.5", "-q", "28", "--no-audio", "-f",
            "webm", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        let Commands::Compress(args) = cli.command else {
            panic!("expected compress");
        };
        assert_eq!(args.max_size_mb, 25.5);
        assert_eq!(args.quality_factor(), Some(28));
        assert!(args.no_audio);
        assert_eq!(args.format, ContainerFormat::Webm);
    }

    #[test]
    fn test_bare_quality_flag_uses_default_factor() {
        let cli = Cli::try_parse_from(["clipfit", "compress", "clip.mov", "-q"]).unwrap();
        let Commands::Compress(args) = cli.command else {
            panic!("expected compress");
        };
        assert_eq!(args.quality_factor(), Some(DEFAULT_QUALITY_FACTOR));
    }

    #[test]
    fn test_thumbnail_output_option() {
        let cli =
            Cli::try_parse_from(["clipfit", "thumbnail", "clip.mov", "-o", "cover.jpg"]).unwrap();
        let Commands::Thumbnail(args) = cli.command else {
            panic!("expected thumbnail");
        };
        assert_eq!(args.input_path, PathBuf::from("clip.mov"));
        assert_eq!(args.output, Some(PathBuf::from("cover.jpg")));
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        assert!(Cli::try_parse_from(["clipfit", "compress", "a.mp4", "-q", "0"]).is_err());
        assert!(Cli::try_parse_from(["clipfit", "compress", "a.mp4", "-q", "52"]).is_err());
        assert!(Cli::try_parse_from(["clipfit", "compress", "a.mp4", "-s", "0"]).is_err());
        assert!(Cli::try_parse_from(["clipfit", "compress", "a.mp4", "-s", "-3"]).is_err());
        assert!(Cli::try_parse_from(["clipfit", "compress", "a.mp4", "-f", "avi"]).is_err());
    }
}
