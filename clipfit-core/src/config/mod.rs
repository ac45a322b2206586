//! Configuration structures and constants for the clipfit-core library.
//!
//! This module provides the knobs of the compression controller: the encoder
//! preset, the attempt budget and the bitrate backoff factor, plus the fixed
//! sets of accepted input extensions and output containers.

mod builder;

use std::path::PathBuf;

use crate::error::{CoreError, CoreResult};

pub use builder::CoreConfigBuilder;

// Default constants

/// Maximum number of encode attempts for one job.
/// After this many attempts the last result is returned even if it is over budget.
pub const MAX_ATTEMPTS: u32 = 10;

/// Multiplicative backoff applied to the bitrate after an attempt overshoots.
pub const BITRATE_BACKOFF_FACTOR: f64 = 0.85;

/// Default x264-style encoder preset passed to ffmpeg.
pub const DEFAULT_ENCODER_PRESET: &str = "fast";

/// Default size budget in megabytes (1 MB = 1024 * 1024 bytes).
pub const DEFAULT_MAX_SIZE_MB: f64 = 10.0;

/// Default constant-quality factor offered by front ends.
pub const DEFAULT_QUALITY_FACTOR: u8 = 23;

/// Lowest accepted constant-quality factor.
pub const MIN_QUALITY_FACTOR: u8 = 1;

/// Highest accepted constant-quality factor.
pub const MAX_QUALITY_FACTOR: u8 = 51;

/// Marker appended to output file names.
pub const COMPRESSED_SUFFIX: &str = "-compressed";

/// Video container extensions accepted as input (lowercase, without dot).
pub const ALLOWED_INPUT_EXTENSIONS: &[&str] = &[
    "mp4", "mkv", "mov", "avi", "webm", "flv", "wmv", "m4v", "mpg", "mpeg", "3gp", "ts",
];

/// Returns true if `path` carries one of [`ALLOWED_INPUT_EXTENSIONS`] (case-insensitive).
#[must_use]
pub fn is_allowed_input(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ALLOWED_INPUT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Main configuration structure for the clipfit-core library.
///
/// All fields have defaults; the builder provides a fluent way to override them.
///
/// # Examples
///
/// ```rust
/// use clipfit_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .encoder_preset("medium")
///     .max_attempts(5)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Encoder preset passed as `-preset` (speed vs. compression efficiency)
    pub encoder_preset: String,

    /// Attempt budget for bitrate mode, at most [`MAX_ATTEMPTS`]
    pub max_attempts: u32,

    /// Factor applied to the bitrate after an oversized attempt, in (0, 1)
    pub bitrate_backoff_factor: f64,

    /// Optional explicit ffmpeg binary; `ffmpeg` from PATH otherwise
    pub ffmpeg_path: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            encoder_preset: DEFAULT_ENCODER_PRESET.to_string(),
            max_attempts: MAX_ATTEMPTS,
            bitrate_backoff_factor: BITRATE_BACKOFF_FACTOR,
            ffmpeg_path: None,
        }
    }
}

impl CoreConfig {
    /// Checks that every field is within its accepted range.
    pub fn validate(&self) -> CoreResult<()> {
        if self.encoder_preset.trim().is_empty() {
            return Err(CoreError::InvalidRequest(
                "encoder preset must not be empty".to_string(),
            ));
        }

        if self.max_attempts == 0 || self.max_attempts > MAX_ATTEMPTS {
            return Err(CoreError::InvalidRequest(format!(
                "max attempts must be between 1 and {MAX_ATTEMPTS}, got {}",
                self.max_attempts
            )));
        }

        if !(self.bitrate_backoff_factor > 0.0 && self.bitrate_backoff_factor < 1.0) {
            return Err(CoreError::InvalidRequest(format!(
                "bitrate backoff factor must be in (0, 1), got {}",
                self.bitrate_backoff_factor
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_config_is_valid() {
        let config = CoreConfig::default();
        assert_eq!(config.max_attempts, 10);
        assert_eq!(config.bitrate_backoff_factor, 0.85);
        assert_eq!(config.encoder_preset, "fast");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let mut config = CoreConfig::default();
        config.max_attempts = 11;
        assert!(config.validate().is_err());

        config.max_attempts = 0;
        assert!(config.validate().is_err());

        config.max_attempts = 3;
        config.bitrate_backoff_factor = 1.0;
        assert!(config.validate().is_err());

        config.bitrate_backoff_factor = 0.5;
        config.encoder_preset = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_is_allowed_input() {
        assert!(is_allowed_input(Path::new("clip.mp4")));
        assert!(is_allowed_input(Path::new("/videos/Holiday.MKV")));
        assert!(!is_allowed_input(Path::new("notes.txt")));
        assert!(!is_allowed_input(Path::new("no_extension")));
    }
}
