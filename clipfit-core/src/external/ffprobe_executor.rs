//! FFprobe integration for media inspection
//!
//! The compression controller needs exactly one fact from the source before
//! it can plan a bitrate: its duration. The `probe` front-end command also
//! shows dimensions and stream layout, so a small [`MediaInfo`] is exposed
//! as well.

use std::path::Path;

use ffprobe::{FfProbeError, ffprobe};
use serde::Serialize;

use crate::config::{ALLOWED_INPUT_EXTENSIONS, is_allowed_input};
use crate::error::{CoreError, CoreResult, command_failed_error, command_start_error};

/// Basic facts about a media file.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct MediaInfo {
    /// Container duration in seconds, if reported
    pub duration: Option<f64>,
    /// Width of the first video stream
    pub width: Option<i64>,
    /// Height of the first video stream
    pub height: Option<i64>,
    /// Codec of the first video stream
    pub video_codec: Option<String>,
    /// Number of audio streams
    pub audio_streams: usize,
}

/// Trait for inspecting source media.
///
/// Implementors provide raw readings; the provided [`probe_duration`]
/// applies the input-extension guard and the duration validity rules so
/// every implementation behaves the same way.
///
/// [`probe_duration`]: FfprobeExecutor::probe_duration
pub trait FfprobeExecutor {
    /// Reads the container duration in seconds, `None` when ffprobe does not report one.
    fn read_duration(&self, input_path: &Path) -> CoreResult<Option<f64>>;

    /// Reads dimensions, codec and stream counts.
    fn read_media_info(&self, input_path: &Path) -> CoreResult<MediaInfo>;

    /// Returns the source duration in seconds.
    ///
    /// Fails with [`CoreError::UnsupportedInput`] for an unrecognized
    /// extension (before ffprobe runs) and with [`CoreError::DurationUnknown`]
    /// when the duration is missing, zero, or not a finite number.
    fn probe_duration(&self, input_path: &Path) -> CoreResult<f64> {
        ensure_allowed_input(input_path)?;
        match self.read_duration(input_path)? {
            Some(duration) if duration.is_finite() && duration > 0.0 => {
                log::debug!(
                    "Probed duration of {}: {:.3}s",
                    input_path.display(),
                    duration
                );
                Ok(duration)
            }
            other => {
                log::warn!(
                    "Unusable duration {:?} reported for {}",
                    other,
                    input_path.display()
                );
                Err(CoreError::DurationUnknown(input_path.to_path_buf()))
            }
        }
    }

    /// Returns [`MediaInfo`] for a recognized input file.
    fn probe_media_info(&self, input_path: &Path) -> CoreResult<MediaInfo> {
        ensure_allowed_input(input_path)?;
        self.read_media_info(input_path)
    }
}

/// Rejects paths whose extension is not an accepted video container.
pub fn ensure_allowed_input(input_path: &Path) -> CoreResult<()> {
    if is_allowed_input(input_path) {
        Ok(())
    } else {
        Err(CoreError::UnsupportedInput {
            path: input_path.to_path_buf(),
            allowed: ALLOWED_INPUT_EXTENSIONS.join(", "),
        })
    }
}

/// `FfprobeExecutor` backed by the `ffprobe` crate.
#[derive(Debug, Clone, Default)]
pub struct CrateFfprobeExecutor;

impl CrateFfprobeExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl FfprobeExecutor for CrateFfprobeExecutor {
    fn read_duration(&self, input_path: &Path) -> CoreResult<Option<f64>> {
        log::debug!(
            "Running ffprobe (via crate) for duration on: {}",
            input_path.display()
        );
        match ffprobe(input_path) {
            Ok(metadata) => Ok(parse_duration(metadata.format.duration.as_deref())),
            Err(err) => {
                log::error!(
                    "ffprobe failed for duration on {}: {:?}",
                    input_path.display(),
                    err
                );
                Err(map_ffprobe_error(err, "duration"))
            }
        }
    }

    fn read_media_info(&self, input_path: &Path) -> CoreResult<MediaInfo> {
        log::debug!(
            "Running ffprobe (via crate) for media info on: {}",
            input_path.display()
        );
        match ffprobe(input_path) {
            Ok(metadata) => {
                let mut info = MediaInfo {
                    duration: parse_duration(metadata.format.duration.as_deref()),
                    ..Default::default()
                };

                if let Some(video_stream) = metadata
                    .streams
                    .iter()
                    .find(|s| s.codec_type.as_deref() == Some("video"))
                {
                    info.width = video_stream.width;
                    info.height = video_stream.height;
                    info.video_codec = video_stream.codec_name.clone();
                }

                info.audio_streams = metadata
                    .streams
                    .iter()
                    .filter(|s| s.codec_type.as_deref() == Some("audio"))
                    .count();

                Ok(info)
            }
            Err(err) => {
                log::warn!("Failed to get media info: {err:?}");
                Err(map_ffprobe_error(err, "media info"))
            }
        }
    }
}

fn parse_duration(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|d| d.trim().parse::<f64>().ok())
}

fn map_ffprobe_error(err: FfProbeError, context: &str) -> CoreError {
    match err {
        FfProbeError::Io(io_err) => command_start_error(format!("ffprobe ({context})"), io_err),
        FfProbeError::Status(output) => {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            command_failed_error(format!("ffprobe ({context})"), output.status, stderr)
        }
        FfProbeError::Deserialize(err) => CoreError::JsonParseError(format!(
            "ffprobe {context} output deserialization: {err}"
        )),
        _ => CoreError::FfprobeParse(format!(
            "Unknown ffprobe error during {context}: {err:?}"
        )),
    }
}
