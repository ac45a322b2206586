//! `FFmpeg` progress handler
//!
//! Turns the event stream of one ffmpeg run into completion fractions,
//! forwards ffmpeg's own log lines to the `log` facade, and keeps the error
//! lines so a failed attempt can report what went wrong.

use ffmpeg_sidecar::event::{FfmpegEvent, FfmpegProgress, LogLevel as FfmpegLogLevel};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::utils::{format_duration, parse_ffmpeg_time};

/// Error lines kept per attempt; older ones are dropped.
const STDERR_TAIL_LINES: usize = 20;

/// Handler for `FFmpeg` progress events
pub struct FfmpegProgressHandler {
    duration: Option<f64>,
    attempt_index: u32,
    last_fraction: f64,
    last_log_time: Instant,
    last_logged_percent_threshold: i32,
    stderr_tail: VecDeque<String>,
}

impl FfmpegProgressHandler {
    /// Creates a handler for one attempt. Without a usable duration no
    /// fractions are produced.
    #[must_use]
    pub fn new(duration: Option<f64>, attempt_index: u32) -> Self {
        Self {
            duration: duration.filter(|d| d.is_finite() && *d > 0.0),
            attempt_index,
            last_fraction: 0.0,
            last_log_time: Instant::now(),
            last_logged_percent_threshold: -1,
            stderr_tail: VecDeque::with_capacity(STDERR_TAIL_LINES),
        }
    }

    /// Handles an `FFmpeg` event, returning the new completion fraction for
    /// progress events when the duration is known.
    pub fn handle_event(&mut self, event: FfmpegEvent) -> Option<f64> {
        match event {
            FfmpegEvent::Progress(progress) => return self.handle_progress(&progress),
            FfmpegEvent::Log(level, message) => self.handle_log(&level, &message),
            FfmpegEvent::Error(error) => self.handle_error(&error),
            _ => {}
        }
        None
    }

    /// The most recent error lines, newline-terminated, oldest first.
    #[must_use]
    pub fn stderr_buffer(&self) -> String {
        self.stderr_tail.iter().fold(String::new(), |mut buffer, line| {
            buffer.push_str(line);
            buffer.push('\n');
            buffer
        })
    }

    fn handle_progress(&mut self, progress: &FfmpegProgress) -> Option<f64> {
        let total = self.duration?;
        let current_secs = parse_ffmpeg_time(&progress.time).unwrap_or(0.0);
        let fraction = (current_secs / total).clamp(0.0, 1.0).max(self.last_fraction);
        self.last_fraction = fraction;

        self.log_progress_if_needed(fraction, current_secs, total, progress.speed);
        Some(fraction)
    }

    fn handle_log(&mut self, level: &FfmpegLogLevel, message: &str) {
        let log_level = map_ffmpeg_log_level(level);

        if matches!(level, FfmpegLogLevel::Fatal | FfmpegLogLevel::Error) {
            self.push_stderr(message);
        }

        if log_level == log::Level::Info {
            log::debug!(target: "ffmpeg_log", "{message}");
        } else {
            log::log!(target: "ffmpeg_log", log_level, "{message}");
        }
    }

    fn handle_error(&mut self, error: &str) {
        if is_non_critical_ffmpeg_error(error) {
            log::debug!("ffmpeg non-critical message: {error}");
        } else {
            log::error!("ffmpeg stderr error: {error}");
        }

        self.push_stderr(error);
    }

    fn push_stderr(&mut self, line: &str) {
        if self.stderr_tail.len() == STDERR_TAIL_LINES {
            self.stderr_tail.pop_front();
        }
        self.stderr_tail.push_back(line.to_string());
    }

    /// Logs every 10% and at least every five minutes so file logs show
    /// long encodes advancing.
    fn log_progress_if_needed(&mut self, fraction: f64, current_secs: f64, total: f64, speed: f32) {
        let percent = fraction * 100.0;
        let current_threshold = (percent as i32 / 10) * 10;
        let should_log = (current_threshold > self.last_logged_percent_threshold
            && current_threshold >= 10)
            || self.last_logged_percent_threshold < 0
            || self.last_log_time.elapsed() >= Duration::from_secs(300);

        if should_log {
            log::info!(
                target: "clipfit::progress",
                "Attempt {} progress: {:.1}% | Time: {} / {} | Speed: {:.2}x",
                self.attempt_index + 1,
                percent,
                format_duration(current_secs),
                format_duration(total),
                speed,
            );
            self.last_log_time = Instant::now();
            self.last_logged_percent_threshold = current_threshold;
        }
    }
}

/// Maps `FFmpeg` log level to Rust log level
fn map_ffmpeg_log_level(level: &FfmpegLogLevel) -> log::Level {
    match level {
        FfmpegLogLevel::Fatal | FfmpegLogLevel::Error => log::Level::Error,
        FfmpegLogLevel::Warning => log::Level::Warn,
        FfmpegLogLevel::Info => log::Level::Info,
        _ => log::Level::Trace,
    }
}

/// Determines if an `FFmpeg` error message is non-critical.
///
/// These are `FFmpeg` messages that appear in stderr but don't indicate actual problems.
fn is_non_critical_ffmpeg_error(error: &str) -> bool {
    error.contains("deprecated pixel format")
        || error.contains("No accelerated colorspace conversion")
        || error.contains("Stream map")
        || error.contains("automatically inserted filter")
        || error.contains("Timestamps are unset")
        || error.contains("Queue input is backward")
        || error.contains("first frame is no keyframe")
}
