// ============================================================================
// clipfit-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and File Logging
//
// Configures the `log` facade through fern. Console output goes to stderr
// with colored level names so stdout stays free for results (and for JSON
// output). When a log directory is given, a second, uncolored sink writes
// every record at debug level to `clipfit_<timestamp>.log`.
//
// Core modules log under their module path; ffmpeg's own log lines arrive
// under the `ffmpeg_log` target and are only shown on the console in
// verbose mode. Periodic progress lines (`clipfit::progress`) are kept off
// the console while a progress bar is drawn.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{Level, LevelFilter};
use owo_colors::OwoColorize;

/// Target that core uses for lines forwarded from ffmpeg.
const FFMPEG_LOG_TARGET: &str = "ffmpeg_log";

/// Target that core uses for periodic attempt progress lines.
const PROGRESS_LOG_TARGET: &str = "clipfit::progress";

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
///
/// # Example
/// ```
/// let log_filename = format!("clipfit_{}.log", clipfit_cli::logging::get_timestamp());
/// assert!(log_filename.starts_with("clipfit_"));
/// ```
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Level for console output.
pub fn console_level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger.
///
/// Returns the path of the log file when `log_dir` is set.
pub fn setup_logging(
    verbose: bool,
    progress_bar: bool,
    log_dir: Option<&Path>,
) -> Result<Option<PathBuf>> {
    let level = console_level(verbose);
    let progress_level = if progress_bar { LevelFilter::Warn } else { level };
    let ffmpeg_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let console = fern::Dispatch::new()
        .level(level)
        .level_for(FFMPEG_LOG_TARGET, ffmpeg_level)
        .level_for(PROGRESS_LOG_TARGET, progress_level)
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {}",
                colored_level(record.level()),
                message
            ))
        })
        .chain(std::io::stderr());

    let mut root = fern::Dispatch::new()
        .level(LevelFilter::Debug)
        .chain(console);

    let log_path = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let path = dir.join(format!("clipfit_{}.log", get_timestamp()));
            let file = fern::log_file(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let file_sink = fern::Dispatch::new()
                .level(LevelFilter::Debug)
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "[{} {} {}] {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(file);
            root = root.chain(file_sink);
            Some(path)
        }
        None => None,
    };

    root.apply().context("Failed to initialize logging")?;
    Ok(log_path)
}

fn colored_level(level: Level) -> String {
    let label = match level {
        Level::Error => "error:",
        Level::Warn => "warning:",
        Level::Info => "info:",
        Level::Debug => "debug:",
        Level::Trace => "trace:",
    };
    if !console::colors_enabled_stderr() {
        return label.to_string();
    }
    match level {
        Level::Error => label.red().bold().to_string(),
        Level::Warn => label.yellow().bold().to_string(),
        Level::Info => label.green().to_string(),
        Level::Debug => label.blue().to_string(),
        Level::Trace => label.dimmed().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let stamp = get_timestamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.as_bytes()[8], b'_');
        assert!(stamp.chars().filter(|c| *c != '_').all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_console_level() {
        assert_eq!(console_level(true), LevelFilter::Debug);
        assert_eq!(console_level(false), LevelFilter::Info);
    }
}
