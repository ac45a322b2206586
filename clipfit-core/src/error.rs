//! Error types for the clipfit-core library.
//!
//! Every fallible operation in the crate returns [`CoreResult`]. Probe and
//! encoder failures are fatal to a job; cancellation is carried as
//! [`CoreError::Cancelled`] internally and surfaced to callers as
//! `CompressionOutcome::Cancelled` rather than as an error.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors produced by the core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Another compression job is already running")]
    Busy,

    #[error("Compression was cancelled")]
    Cancelled,

    #[error("Invalid compression request: {0}")]
    InvalidRequest(String),

    #[error("Unsupported input file '{path}': extension must be one of {allowed}")]
    UnsupportedInput { path: PathBuf, allowed: String },

    #[error("Could not determine the duration of '{0}'")]
    DurationUnknown(PathBuf),

    #[error("Required command '{0}' not found in PATH")]
    DependencyNotFound(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed while waiting for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    #[error("{cmd} exited with {status}: {stderr}")]
    CommandFailed {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Failed to parse ffprobe output: {0}")]
    FfprobeParse(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParseError(String),

    #[error("Encoder failed: {0}")]
    EncodeFailed(String),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Notification error: {0}")]
    NotificationError(String),
}

/// Result type for clipfit-core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Returns true for errors raised while inspecting the source file.
    #[must_use]
    pub fn is_probe_error(&self) -> bool {
        match self {
            CoreError::DurationUnknown(_)
            | CoreError::FfprobeParse(_)
            | CoreError::JsonParseError(_)
            | CoreError::UnsupportedInput { .. } => true,
            CoreError::CommandStart(cmd, _)
            | CoreError::CommandWait(cmd, _)
            | CoreError::CommandFailed { cmd, .. } => cmd.starts_with("ffprobe"),
            _ => false,
        }
    }
}

/// Builds a [`CoreError::CommandStart`] for a command that could not be spawned.
pub fn command_start_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd.into(), err)
}

/// Builds a [`CoreError::CommandWait`] for a command whose exit could not be collected.
pub fn command_wait_error(cmd: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd.into(), err)
}

/// Builds a [`CoreError::CommandFailed`] for a command that exited unsuccessfully.
pub fn command_failed_error(
    cmd: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::CommandFailed {
        cmd: cmd.into(),
        status,
        stderr: stderr.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_classification() {
        assert!(CoreError::DurationUnknown(PathBuf::from("a.mp4")).is_probe_error());
        assert!(
            command_start_error("ffprobe (duration)", io::Error::from(io::ErrorKind::NotFound))
                .is_probe_error()
        );
        assert!(
            !command_start_error("ffmpeg", io::Error::from(io::ErrorKind::NotFound))
                .is_probe_error()
        );
        assert!(!CoreError::Busy.is_probe_error());
        assert!(!CoreError::EncodeFailed("disk full".to_string()).is_probe_error());
    }

    #[test]
    fn test_busy_message_is_human_readable() {
        assert_eq!(
            CoreError::Busy.to_string(),
            "Another compression job is already running"
        );
    }
}
