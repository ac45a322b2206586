// ============================================================================
// clipfit-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Fluent construction of CoreConfig. Fields not set keep the defaults from
// config/mod.rs; range checks happen in CoreConfig::validate.

use std::path::PathBuf;

use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use clipfit_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .encoder_preset("slow")
///     .bitrate_backoff_factor(0.9)
///     .ffmpeg_path("/opt/ffmpeg/bin/ffmpeg")
///     .build();
/// assert_eq!(config.encoder_preset, "slow");
/// ```
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Creates a new builder holding the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the ffmpeg `-preset` value.
    pub fn encoder_preset(mut self, preset: &str) -> Self {
        self.config.encoder_preset = preset.to_string();
        self
    }

    /// Sets the attempt budget used in bitrate mode.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    /// Sets the factor applied to the bitrate after an oversized attempt.
    pub fn bitrate_backoff_factor(mut self, factor: f64) -> Self {
        self.config.bitrate_backoff_factor = factor;
        self
    }

    /// Uses an explicit ffmpeg binary instead of the one on PATH.
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.ffmpeg_path = Some(path.into());
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults_match_core_defaults() {
        let built = CoreConfigBuilder::new().build();
        let default = CoreConfig::default();
        assert_eq!(built.encoder_preset, default.encoder_preset);
        assert_eq!(built.max_attempts, default.max_attempts);
        assert_eq!(built.bitrate_backoff_factor, default.bitrate_backoff_factor);
        assert!(built.ffmpeg_path.is_none());
    }

    #[test]
    fn test_builder_overrides() {
        let config = CoreConfigBuilder::new()
            .encoder_preset("veryfast")
            .max_attempts(4)
            .bitrate_backoff_factor(0.75)
            .ffmpeg_path("/usr/local/bin/ffmpeg")
            .build();

        assert_eq!(config.encoder_preset, "veryfast");
        assert_eq!(config.max_attempts, 4);
        assert_eq!(config.bitrate_backoff_factor, 0.75);
        assert_eq!(config.ffmpeg_path, Some(PathBuf::from("/usr/local/bin/ffmpeg")));
    }
}
