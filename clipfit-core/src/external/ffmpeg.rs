//! FFmpeg command building and execution for one encode attempt
//!
//! An attempt is a single ffmpeg run from the source to the allocated output
//! path with fixed parameters. The session decides what to do with the result;
//! this module only guarantees that every attempt ends in exactly one of
//! completed, cancelled or failed.

use std::path::{Path, PathBuf};

use ffmpeg_sidecar::command::FfmpegCommand;
use log::{debug, error, info, warn};

use crate::bitrate::EncodeParameters;
use crate::cancel::CancellationToken;
use crate::error::{CoreError, CoreResult};
use crate::external::ffmpeg_executor::{FfmpegProcess, FfmpegSpawner};
use crate::progress_reporting::ffmpeg_handler::FfmpegProgressHandler;
use crate::request::ContainerFormat;

/// Parameters required for running one `FFmpeg` encode attempt.
#[derive(Debug, Clone)]
pub struct EncodeParams {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub parameters: EncodeParameters,
    pub container: ContainerFormat,
    pub suppress_audio: bool,
    pub preset: String,
    /// Explicit ffmpeg binary, `ffmpeg` from PATH when `None`
    pub ffmpeg_path: Option<PathBuf>,
    /// Zero-based attempt number, used for logging
    pub attempt_index: u32,
}

/// Terminal result of an attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptResult {
    /// ffmpeg exited successfully and the output file is complete.
    Completed,
    /// Cancellation was observed; the process was killed.
    Cancelled,
}

/// Builds the `FFmpeg` command for one attempt.
///
/// The shape is `-y -i <input> -c:v <codec> <rate control> [-preset <p>]
/// [-an | -c:a <codec>] [-movflags +faststart] <output>`. Bitrate mode caps
/// the rate with `-maxrate` and a two-second `-bufsize`; quality mode uses
/// `-crf`.
#[must_use]
pub fn build_ffmpeg_command(params: &EncodeParams) -> FfmpegCommand {
    let mut cmd = match &params.ffmpeg_path {
        Some(path) => FfmpegCommand::new_with_path(path),
        None => FfmpegCommand::new(),
    };

    cmd.overwrite();
    cmd.input(params.input_path.to_string_lossy().as_ref());
    cmd.args(["-c:v", params.container.video_codec()]);

    match params.parameters {
        EncodeParameters::Bitrate { bitrate_bps } => {
            let rate = bitrate_bps.to_string();
            let bufsize = bitrate_bps.saturating_mul(2).to_string();
            cmd.args(["-b:v", rate.as_str()]);
            cmd.args(["-maxrate", rate.as_str()]);
            cmd.args(["-bufsize", bufsize.as_str()]);
        }
        EncodeParameters::ConstantQuality { quality_factor } => {
            cmd.args(["-crf", quality_factor.to_string().as_str()]);
            if params.container == ContainerFormat::Webm {
                // libvpx-vp9 only honours -crf as pure constant quality with -b:v 0.
                cmd.args(["-b:v", "0"]);
            }
        }
    }

    if params.container.supports_preset() {
        cmd.args(["-preset", params.preset.as_str()]);
    }

    if params.suppress_audio {
        cmd.arg("-an");
    } else {
        cmd.args(["-c:a", params.container.audio_codec()]);
    }

    if params.container.supports_faststart() {
        cmd.args(["-movflags", "+faststart"]);
    }

    cmd.output(params.output_path.to_string_lossy().as_ref());
    cmd
}

/// Runs one encode attempt to completion, cancellation, or failure.
///
/// `on_progress` receives completion fractions while the attempt runs and
/// is never called again once cancellation has been observed. On
/// cancellation the process is killed and reaped before returning.
pub fn run_encode_attempt<S, F>(
    spawner: &S,
    params: &EncodeParams,
    duration_secs: Option<f64>,
    cancel: &CancellationToken,
    mut on_progress: F,
) -> CoreResult<AttemptResult>
where
    S: FfmpegSpawner,
    F: FnMut(f64),
{
    if cancel.is_cancelled() {
        return Ok(AttemptResult::Cancelled);
    }

    info!(
        target: "clipfit::progress",
        "Starting attempt {} ({}): {} -> {}",
        params.attempt_index + 1,
        params.parameters,
        params.input_path.display(),
        params.output_path.display()
    );

    let cmd = build_ffmpeg_command(params);
    debug!("FFmpeg command: {cmd:?}");

    let mut process = spawner.spawn(cmd)?;
    let mut handler = FfmpegProgressHandler::new(duration_secs, params.attempt_index);

    let streamed = process.handle_events(|event| {
        if cancel.is_cancelled() {
            return Err(CoreError::Cancelled);
        }
        if let Some(fraction) = handler.handle_event(event) {
            on_progress(fraction);
        }
        Ok(())
    });

    match streamed {
        Ok(()) => {}
        Err(CoreError::Cancelled) => {
            terminate(&mut process);
            info!("Attempt {} cancelled", params.attempt_index + 1);
            return Ok(AttemptResult::Cancelled);
        }
        Err(err) => {
            error!("Lost the ffmpeg event stream: {err}");
            terminate(&mut process);
            return Err(err);
        }
    }

    let status = process.wait()?;

    if cancel.is_cancelled() {
        info!(
            "Cancellation requested as attempt {} finished",
            params.attempt_index + 1
        );
        return Ok(AttemptResult::Cancelled);
    }

    if status.success() {
        debug!("Attempt {} finished successfully", params.attempt_index + 1);
        Ok(AttemptResult::Completed)
    } else {
        let stderr_tail = handler.stderr_buffer();
        let stderr = stderr_tail.trim();
        error!(
            "FFmpeg exited with {status} on attempt {}",
            params.attempt_index + 1
        );
        Err(CoreError::EncodeFailed(if stderr.is_empty() {
            format!("ffmpeg exited with {status}")
        } else {
            format!("ffmpeg exited with {status}: {stderr}")
        }))
    }
}

/// Kills and reaps a process whose output is no longer wanted.
fn terminate<P: FfmpegProcess>(process: &mut P) {
    if let Err(err) = process.kill() {
        warn!("Failed to kill ffmpeg: {err}");
    }
    if let Err(err) = process.wait() {
        warn!("Failed to reap ffmpeg after kill: {err}");
    }
}

/// Deletes a partial or abandoned output file, ignoring a missing file.
pub fn cleanup_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!("Removed partial output {}", path.display()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => warn!(
            "Failed to remove partial output at {}: {}",
            path.display(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(parameters: EncodeParameters, container: ContainerFormat) -> EncodeParams {
        EncodeParams {
            input_path: PathBuf::from("input.mov"),
            output_path: PathBuf::from("out/input-compressed.mp4"),
            parameters,
            container,
            suppress_audio: false,
            preset: "fast".to_string(),
            ffmpeg_path: None,
            attempt_index: 0,
        }
    }

    fn args_of(cmd: &FfmpegCommand) -> Vec<String> {
        cmd.get_args()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    fn has_pair(args: &[String], flag: &str, value: &str) -> bool {
        args.windows(2).any(|w| w[0] == flag && w[1] == value)
    }

    #[test]
    fn test_bitrate_mode_command() {
        let cmd = build_ffmpeg_command(&params(
            EncodeParameters::Bitrate { bitrate_bps: 699_050 },
            ContainerFormat::Mp4,
        ));
        let args = args_of(&cmd);

        assert!(args.iter().any(|a| a == "-y"));
        assert!(has_pair(&args, "-i", "input.mov"));
        assert!(has_pair(&args, "-c:v", "libx264"));
        assert!(has_pair(&args, "-b:v", "699050"));
        assert!(has_pair(&args, "-maxrate", "699050"));
        assert!(has_pair(&args, "-bufsize", "1398100"));
        assert!(has_pair(&args, "-preset", "fast"));
        assert!(has_pair(&args, "-c:a", "aac"));
        assert!(has_pair(&args, "-movflags", "+faststart"));
        assert!(!args.iter().any(|a| a == "-crf"));
        assert_eq!(args.last().unwrap(), "out/input-compressed.mp4");
    }

    #[test]
    fn test_quality_mode_command_without_audio() {
        let mut p = params(
            EncodeParameters::ConstantQuality { quality_factor: 23 },
            ContainerFormat::Mkv,
        );
        p.suppress_audio = true;
        let args = args_of(&build_ffmpeg_command(&p));

        assert!(has_pair(&args, "-crf", "23"));
        assert!(args.iter().any(|a| a == "-an"));
        assert!(!args.iter().any(|a| a == "-c:a"));
        assert!(!args.iter().any(|a| a == "-b:v"));
        assert!(!args.iter().any(|a| a == "-movflags"));
    }

    #[test]
    fn test_webm_uses_vp9_and_opus() {
        let args = args_of(&build_ffmpeg_command(&params(
            EncodeParameters::ConstantQuality { quality_factor: 31 },
            ContainerFormat::Webm,
        )));

        assert!(has_pair(&args, "-c:v", "libvpx-vp9"));
        assert!(has_pair(&args, "-c:a", "libopus"));
        assert!(has_pair(&args, "-b:v", "0"));
        assert!(!args.iter().any(|a| a == "-preset"));
    }

    #[test]
    fn test_cleanup_partial_output_ignores_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.mp4");
        cleanup_partial_output(&path);

        std::fs::write(&path, b"partial").unwrap();
        cleanup_partial_output(&path);
        assert!(!path.exists());
    }
}
