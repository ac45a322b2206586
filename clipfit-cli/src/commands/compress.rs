// ============================================================================
// clipfit-cli/src/commands/compress.rs
// ============================================================================
//
// COMPRESS COMMAND: Shrink one video under a size limit
//
// Validates the arguments up front (input exists, extension accepted, size
// positive) so that obvious mistakes are reported before any external tool
// is looked up. The job itself runs on a blocking worker thread; the async
// side waits for either the worker or Ctrl-C, and on Ctrl-C asks the
// compressor to stop and then waits for the worker to wind down.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clipfit_core::external::ffprobe_executor::ensure_allowed_input;
use clipfit_core::notifications::NullNotificationSender;
use clipfit_core::{
    CompressionOutcome, CompressionRequest, CoreConfig, CoreConfigBuilder, CoreResult,
    DefaultCompressor, NotificationSender, NotificationType, NtfyNotificationSender,
    check_dependency,
};
use log::{debug, info, warn};

use crate::cli::CompressArgs;
use crate::output;
use crate::progress::CliProgress;

/// How a compress run ended, for choosing the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressStatus {
    Completed { within_budget: bool },
    Cancelled,
}

/// Builds the core request from CLI arguments.
pub fn build_request(args: &CompressArgs) -> Result<CompressionRequest> {
    let input_path = &args.input_path;
    if !input_path.is_file() {
        bail!("Input file '{}' does not exist", input_path.display());
    }
    ensure_allowed_input(input_path)?;

    let output_dir = resolve_output_dir(args.output_dir.as_deref(), input_path);
    let request = CompressionRequest::from_megabytes(
        input_path.clone(),
        &output_dir,
        args.max_size_mb,
        args.format,
    )?
    .with_quality_factor(args.quality_factor())
    .with_suppressed_audio(args.no_audio);
    request.validate()?;
    Ok(request)
}

/// Builds the core configuration from CLI arguments.
pub fn build_config(args: &CompressArgs) -> CoreConfig {
    let mut builder = CoreConfigBuilder::new().encoder_preset(&args.preset);
    if let Some(ffmpeg) = &args.ffmpeg {
        builder = builder.ffmpeg_path(ffmpeg.clone());
    }
    builder.build()
}

/// Output goes next to the input unless a directory was given.
fn resolve_output_dir(output_dir: Option<&Path>, input_path: &Path) -> PathBuf {
    match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
    }
}

fn build_notifier(topic_url: Option<&str>) -> Result<Box<dyn NotificationSender>> {
    match topic_url {
        Some(url) => {
            let sender = NtfyNotificationSender::new(url)
                .with_context(|| format!("Invalid ntfy topic '{url}'"))?;
            info!("Notifications will be sent to {}", sender.topic_url());
            Ok(Box::new(sender))
        }
        None => Ok(Box::new(NullNotificationSender)),
    }
}

/// Sends the notification matching `outcome`. Failures are only logged.
fn notify_outcome(
    notifier: &dyn NotificationSender,
    input_path: &Path,
    outcome: &CoreResult<CompressionOutcome>,
    started: Instant,
) {
    let notification = match outcome {
        Ok(CompressionOutcome::Completed(result)) => NotificationType::CompressComplete {
            input_path: input_path.to_path_buf(),
            output_path: result.output_path.clone(),
            output_size: result.final_size_bytes,
            within_budget: result.within_budget,
            elapsed: started.elapsed(),
        },
        Ok(CompressionOutcome::Cancelled) => NotificationType::CompressCancelled {
            input_path: input_path.to_path_buf(),
        },
        Err(e) => NotificationType::CompressError {
            input_path: input_path.to_path_buf(),
            message: e.to_string(),
        },
    };
    if let Err(e) = notifier.send_notification(&notification) {
        warn!("Failed to send notification: {e}");
    }
}

/// Runs the `compress` command.
pub async fn run_compress(args: CompressArgs, show_progress: bool) -> Result<CompressStatus> {
    let request = build_request(&args)?;
    let config = build_config(&args);

    let ffmpeg = config
        .ffmpeg_path
        .clone()
        .unwrap_or_else(|| PathBuf::from("ffmpeg"));
    check_dependency(&ffmpeg)?;
    check_dependency("ffprobe")?;

    let notifier = build_notifier(args.ntfy.as_deref())?;
    let compressor = Arc::new(DefaultCompressor::with_config(config)?);

    let max_attempts = if request.is_quality_mode() {
        1
    } else {
        compressor.config().max_attempts
    };
    let progress = CliProgress::new(show_progress && !args.json, max_attempts);
    let input_path = request.input_path.clone();
    let input_size = fs::metadata(&input_path).ok().map(|m| m.len());
    debug!("Request: {request:?}");

    let mut worker = {
        let compressor = Arc::clone(&compressor);
        let progress = progress.clone();
        let input_path = input_path.clone();
        tokio::task::spawn_blocking(move || {
            let started = Instant::now();
            let outcome = compressor.compress(request, |event| progress.update(&event));
            notify_outcome(notifier.as_ref(), &input_path, &outcome, started);
            outcome
        })
    };

    let joined = tokio::select! {
        joined = &mut worker => joined,
        Ok(()) = tokio::signal::ctrl_c() => {
            warn!("Interrupt received, stopping the current encode...");
            compressor.stop();
            worker.await
        }
    };
    progress.finish();

    let outcome = joined.context("Compression worker stopped unexpectedly")??;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }

    match outcome {
        CompressionOutcome::Completed(result) => {
            if !args.json {
                output::print_compression_result(&input_path, input_size, &result);
            }
            Ok(CompressStatus::Completed {
                within_budget: result.within_budget,
            })
        }
        CompressionOutcome::Cancelled => {
            if !args.json {
                output::print_warning("Compression cancelled");
            }
            Ok(CompressStatus::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipfit_core::ContainerFormat;
    use tempfile::tempdir;

    fn args_for(input_path: PathBuf) -> CompressArgs {
        CompressArgs {
            input_path,
            output_dir: None,
            max_size_mb: 10.0,
            quality: None,
            no_audio: false,
            format: ContainerFormat::Mp4,
            preset: "fast".to_string(),
            ntfy: None,
            ffmpeg: None,
            json: false,
        }
    }

    #[test]
    fn test_build_request_defaults_to_input_directory() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("holiday.mov");
        fs::write(&input, b"not really a video").unwrap();

        let request = build_request(&args_for(input.clone())).unwrap();
        assert_eq!(request.input_path, input);
        assert_eq!(request.output_path, dir.path().join("holiday.mp4"));
        assert_eq!(request.max_output_size_bytes, 10 * 1024 * 1024);
        assert!(!request.is_quality_mode());
    }

    #[test]
    fn test_build_request_applies_options() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        let input = dir.path().join("clip.mkv");
        fs::write(&input, b"x").unwrap();

        let mut args = args_for(input);
        args.output_dir = Some(out.clone());
        args.quality = Some(Some(30));
        args.no_audio = true;
        args.format = ContainerFormat::Webm;

        let request = build_request(&args).unwrap();
        assert_eq!(request.output_path, out.join("clip.webm"));
        assert_eq!(request.quality_factor, Some(30));
        assert!(request.suppress_audio);
        assert_eq!(request.output_container, ContainerFormat::Webm);
    }

    #[test]
    fn test_build_request_rejects_missing_input() {
        let dir = tempdir().unwrap();
        let err = build_request(&args_for(dir.path().join("missing.mp4"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_build_request_rejects_unsupported_extension() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        fs::write(&input, b"x").unwrap();
        let err = build_request(&args_for(input)).unwrap_err();
        assert!(err.to_string().contains("Unsupported input"));
    }

    #[test]
    fn test_build_config_carries_overrides() {
        let dir = tempdir().unwrap();
        let mut args = args_for(dir.path().join("a.mp4"));
        args.preset = "veryslow".to_string();
        args.ffmpeg = Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));

        let config = build_config(&args);
        assert_eq!(config.encoder_preset, "veryslow");
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")));
    }

    #[test]
    fn test_resolve_output_dir_for_bare_filename() {
        assert_eq!(
            resolve_output_dir(None, Path::new("clip.mp4")),
            PathBuf::from(".")
        );
    }

    #[test]
    fn test_invalid_ntfy_topic_is_rejected() {
        assert!(build_notifier(Some("ntfy.sh/clips")).is_err());
        assert!(build_notifier(None).is_ok());
    }
}
