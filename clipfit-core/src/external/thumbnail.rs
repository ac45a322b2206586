//! Single-frame preview extraction
//!
//! Grabs one frame one second into the source and scales it to a fixed
//! width, keeping the aspect ratio. Uses the same spawner as encoding.

use std::path::{Path, PathBuf};

use ffmpeg_sidecar::command::FfmpegCommand;
use log::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg::cleanup_partial_output;
use crate::external::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::external::ffprobe_executor::ensure_allowed_input;
use crate::progress_reporting::ffmpeg_handler::FfmpegProgressHandler;

/// Seek position of the captured frame.
pub const THUMBNAIL_SEEK_SECS: &str = "1";

/// Width of the thumbnail in pixels; height follows the aspect ratio.
pub const THUMBNAIL_WIDTH: u32 = 320;

/// Default thumbnail location: `<stem>-thumb.jpg` next to the input.
#[must_use]
pub fn default_thumbnail_path(input_path: &Path) -> PathBuf {
    let stem = input_path
        .file_stem()
        .map_or_else(|| "thumbnail".into(), |s| s.to_string_lossy());
    input_path.with_file_name(format!("{stem}-thumb.jpg"))
}

/// Builds `-y -ss 1 -i <input> -frames:v 1 -vf scale=320:-1 <output>`.
#[must_use]
pub fn build_thumbnail_command(
    input_path: &Path,
    output_path: &Path,
    ffmpeg_path: Option<&Path>,
) -> FfmpegCommand {
    let mut cmd = match ffmpeg_path {
        Some(path) => FfmpegCommand::new_with_path(path),
        None => FfmpegCommand::new(),
    };

    cmd.overwrite();
    // Seeking before -i makes ffmpeg jump instead of decoding up to the frame.
    cmd.args(["-ss", THUMBNAIL_SEEK_SECS]);
    cmd.input(input_path.to_string_lossy().as_ref());
    cmd.args(["-frames:v", "1"]);
    cmd.args(["-vf", format!("scale={THUMBNAIL_WIDTH}:-1").as_str()]);
    cmd.output(output_path.to_string_lossy().as_ref());
    cmd
}

/// Writes a thumbnail of `input_path` to `output_path`.
///
/// The input must carry an accepted video extension. A failed run leaves
/// no file behind.
pub fn extract_thumbnail<S: FfmpegSpawner>(
    spawner: &S,
    input_path: &Path,
    output_path: &Path,
    ffmpeg_path: Option<&Path>,
) -> CoreResult<PathBuf> {
    ensure_allowed_input(input_path)?;

    let cmd = build_thumbnail_command(input_path, output_path, ffmpeg_path);
    debug!("FFmpeg thumbnail command: {cmd:?}");

    let mut process = spawner.spawn(cmd)?;
    let mut handler = FfmpegProgressHandler::new(None, 0);
    let streamed = process.handle_events(|event| {
        handler.handle_event(event);
        Ok(())
    });
    let status = process.wait()?;
    streamed?;

    if !status.success() {
        cleanup_partial_output(output_path);
        let stderr_tail = handler.stderr_buffer();
        let stderr = stderr_tail.trim();
        return Err(CoreError::EncodeFailed(if stderr.is_empty() {
            format!("thumbnail extraction exited with {status}")
        } else {
            format!("thumbnail extraction exited with {status}: {stderr}")
        }));
    }

    info!("Thumbnail written to {}", output_path.display());
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbnail_command_shape() {
        let cmd = build_thumbnail_command(
            Path::new("clips/holiday.mov"),
            Path::new("clips/holiday-thumb.jpg"),
            None,
        );
        let args: Vec<String> = cmd
            .get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let position = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        let pair = |flag: &str| args[position(flag) + 1].as_str();

        assert!(args.iter().any(|a| a == "-y"));
        assert_eq!(pair("-ss"), "1");
        assert_eq!(pair("-i"), "clips/holiday.mov");
        assert_eq!(pair("-frames:v"), "1");
        assert_eq!(pair("-vf"), "scale=320:-1");
        assert!(position("-ss") < position("-i"));
        assert_eq!(args.last().unwrap(), "clips/holiday-thumb.jpg");
    }

    #[test]
    fn test_default_thumbnail_path() {
        assert_eq!(
            default_thumbnail_path(Path::new("/videos/holiday.mov")),
            PathBuf::from("/videos/holiday-thumb.jpg")
        );
        assert_eq!(
            default_thumbnail_path(Path::new("clip.mp4")),
            PathBuf::from("clip-thumb.jpg")
        );
    }
}
