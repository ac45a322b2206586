//! `thumbnail` command: save one preview frame of a video.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clipfit_core::check_dependency;
use clipfit_core::external::ffprobe_executor::ensure_allowed_input;
use clipfit_core::external::{SidecarSpawner, default_thumbnail_path, extract_thumbnail};

use crate::cli::ThumbnailArgs;
use crate::output;

/// Runs the `thumbnail` command.
pub fn run_thumbnail(args: &ThumbnailArgs) -> Result<()> {
    let input_path = &args.input_path;
    if !input_path.is_file() {
        bail!("Input file '{}' does not exist", input_path.display());
    }
    ensure_allowed_input(input_path)?;

    let ffmpeg = args
        .ffmpeg
        .clone()
        .unwrap_or_else(|| PathBuf::from("ffmpeg"));
    check_dependency(&ffmpeg)?;

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_thumbnail_path(input_path));
    let written = extract_thumbnail(
        &SidecarSpawner,
        input_path,
        &output_path,
        args.ffmpeg.as_deref(),
    )?;
    output::print_info("Thumbnail", written.display());
    Ok(())
}
