//! Compression requests and output containers.
//!
//! A [`CompressionRequest`] is everything a job needs to know up front. It is
//! validated once when the job is accepted and never changes afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_QUALITY_FACTOR, MIN_QUALITY_FACTOR};
use crate::error::{CoreError, CoreResult};
use crate::utils::megabytes_to_bytes;

/// Output containers the encoder can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Mp4,
    Mkv,
    Mov,
    Webm,
}

impl ContainerFormat {
    /// Every supported container, in the order front ends list them.
    pub const ALL: [ContainerFormat; 4] = [
        ContainerFormat::Mp4,
        ContainerFormat::Mkv,
        ContainerFormat::Mov,
        ContainerFormat::Webm,
    ];

    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ContainerFormat::Mp4 => "mp4",
            ContainerFormat::Mkv => "mkv",
            ContainerFormat::Mov => "mov",
            ContainerFormat::Webm => "webm",
        }
    }

    /// ffmpeg video encoder used for this container.
    #[must_use]
    pub fn video_codec(self) -> &'static str {
        match self {
            ContainerFormat::Webm => "libvpx-vp9",
            _ => "libx264",
        }
    }

    /// ffmpeg audio encoder used for this container.
    #[must_use]
    pub fn audio_codec(self) -> &'static str {
        match self {
            ContainerFormat::Webm => "libopus",
            _ => "aac",
        }
    }

    /// True when the video encoder understands x264 `-preset` names.
    #[must_use]
    pub fn supports_preset(self) -> bool {
        self.video_codec() == "libx264"
    }

    /// True for ISO-BMFF containers where the index can be moved to the front.
    #[must_use]
    pub fn supports_faststart(self) -> bool {
        matches!(self, ContainerFormat::Mp4 | ContainerFormat::Mov)
    }

    /// Looks up a container by file extension (case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(ext))
    }
}

impl Default for ContainerFormat {
    fn default() -> Self {
        ContainerFormat::Mp4
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ContainerFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches('.');
        Self::from_extension(trimmed).ok_or_else(|| {
            CoreError::InvalidRequest(format!(
                "unsupported output format '{s}' (expected one of mp4, mkv, mov, webm)"
            ))
        })
    }
}

/// One compression job as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionRequest {
    /// Source video.
    pub input_path: PathBuf,
    /// Size budget in bytes; must be positive.
    pub max_output_size_bytes: u64,
    /// Desired output location. The final name is allocated from this path's
    /// directory and extension.
    pub output_path: PathBuf,
    /// Drop all audio streams.
    pub suppress_audio: bool,
    /// Constant-quality factor; when present the size budget only informs
    /// `within_budget` and no bitrate search happens.
    pub quality_factor: Option<u8>,
    /// Output container.
    pub output_container: ContainerFormat,
}

impl CompressionRequest {
    /// Creates a bitrate-mode request with audio kept and an MP4 container.
    pub fn new(
        input_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        max_output_size_bytes: u64,
    ) -> Self {
        Self {
            input_path: input_path.into(),
            max_output_size_bytes,
            output_path: output_path.into(),
            suppress_audio: false,
            quality_factor: None,
            output_container: ContainerFormat::default(),
        }
    }

    /// Builds a request from the front-end contract: a size limit in
    /// megabytes and an output folder. The desired output path is
    /// `{output_folder}/{input stem}.{container extension}`.
    pub fn from_megabytes(
        input_path: impl Into<PathBuf>,
        output_folder: &Path,
        max_output_size_mb: f64,
        output_container: ContainerFormat,
    ) -> CoreResult<Self> {
        let input_path = input_path.into();
        let max_output_size_bytes = megabytes_to_bytes(max_output_size_mb).ok_or_else(|| {
            CoreError::InvalidRequest(format!(
                "maximum output size must be a positive number of megabytes, got {max_output_size_mb}"
            ))
        })?;
        let stem = input_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .ok_or_else(|| {
                CoreError::PathError(format!(
                    "Failed to get file stem for {}",
                    input_path.display()
                ))
            })?;
        let output_path =
            output_folder.join(format!("{stem}.{}", output_container.extension()));

        Ok(Self {
            output_container,
            ..Self::new(input_path, output_path, max_output_size_bytes)
        })
    }

    /// Switches the request to constant-quality mode.
    #[must_use]
    pub fn with_quality_factor(mut self, quality_factor: Option<u8>) -> Self {
        self.quality_factor = quality_factor;
        self
    }

    #[must_use]
    pub fn with_suppressed_audio(mut self, suppress_audio: bool) -> Self {
        self.suppress_audio = suppress_audio;
        self
    }

    #[must_use]
    pub fn with_container(mut self, output_container: ContainerFormat) -> Self {
        self.output_container = output_container;
        self
    }

    /// True when a quality factor was supplied.
    #[must_use]
    pub fn is_quality_mode(&self) -> bool {
        self.quality_factor.is_some()
    }

    /// Checks field ranges. Input existence and extension are left to the probe.
    pub fn validate(&self) -> CoreResult<()> {
        if self.max_output_size_bytes == 0 {
            return Err(CoreError::InvalidRequest(
                "maximum output size must be greater than zero".to_string(),
            ));
        }

        if let Some(q) = self.quality_factor {
            if !(MIN_QUALITY_FACTOR..=MAX_QUALITY_FACTOR).contains(&q) {
                return Err(CoreError::InvalidRequest(format!(
                    "quality factor must be between {MIN_QUALITY_FACTOR} and {MAX_QUALITY_FACTOR}, got {q}"
                )));
            }
        }

        if self.input_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidRequest(
                "input path must not be empty".to_string(),
            ));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(CoreError::InvalidRequest(
                "output path must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_codecs() {
        assert_eq!(ContainerFormat::Mp4.video_codec(), "libx264");
        assert_eq!(ContainerFormat::Mkv.audio_codec(), "aac");
        assert_eq!(ContainerFormat::Webm.video_codec(), "libvpx-vp9");
        assert_eq!(ContainerFormat::Webm.audio_codec(), "libopus");
        assert!(!ContainerFormat::Webm.supports_preset());
        assert!(ContainerFormat::Mov.supports_faststart());
        assert!(!ContainerFormat::Mkv.supports_faststart());
    }

    #[test]
    fn test_container_parsing() {
        assert_eq!("mp4".parse::<ContainerFormat>().unwrap(), ContainerFormat::Mp4);
        assert_eq!(".MKV".parse::<ContainerFormat>().unwrap(), ContainerFormat::Mkv);
        assert!("avi".parse::<ContainerFormat>().is_err());
        assert_eq!(ContainerFormat::Webm.to_string(), "webm");
    }

    #[test]
    fn test_from_megabytes_builds_output_path() {
        let request = CompressionRequest::from_megabytes(
            "/videos/trip.mov",
            Path::new("/out"),
            10.0,
            ContainerFormat::Mkv,
        )
        .unwrap();

        assert_eq!(request.max_output_size_bytes, 10 * 1024 * 1024);
        assert_eq!(request.output_path, PathBuf::from("/out/trip.mkv"));
        assert_eq!(request.output_container, ContainerFormat::Mkv);
        assert!(!request.is_quality_mode());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_from_megabytes_rejects_non_positive_size() {
        let result = CompressionRequest::from_megabytes(
            "clip.mp4",
            Path::new("."),
            0.0,
            ContainerFormat::Mp4,
        );
        assert!(matches!(result, Err(CoreError::InvalidRequest(_))));
    }

    #[test]
    fn test_validate_quality_range() {
        let base = CompressionRequest::new("in.mp4", "out.mp4", 1024);
        assert!(base.clone().with_quality_factor(Some(1)).validate().is_ok());
        assert!(base.clone().with_quality_factor(Some(51)).validate().is_ok());
        assert!(base.clone().with_quality_factor(Some(0)).validate().is_err());
        assert!(base.with_quality_factor(Some(52)).validate().is_err());
    }

    #[test]
    fn test_validate_zero_budget() {
        let request = CompressionRequest::new("in.mp4", "out.mp4", 0);
        assert!(matches!(
            request.validate(),
            Err(CoreError::InvalidRequest(_))
        ));
    }
}
