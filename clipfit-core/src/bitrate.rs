//! Bitrate model: from a byte budget and a duration to encoder parameters.
//!
//! The target bitrate ignores container overhead and the audio track, so the
//! first attempt usually lands slightly over budget; the retry loop corrects
//! that by shrinking the bitrate geometrically.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::config::BITRATE_BACKOFF_FACTOR;
use crate::error::{CoreError, CoreResult};
use crate::request::CompressionRequest;
use crate::utils::format_bitrate;

/// Lowest bitrate ever requested from the encoder.
pub const MIN_BITRATE_BPS: u64 = 1;

/// Parameters that drive a single encode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EncodeParameters {
    /// Average bitrate targeting the size budget.
    Bitrate { bitrate_bps: u64 },
    /// Constant-quality encoding; size is not constrained.
    ConstantQuality { quality_factor: u8 },
}

impl EncodeParameters {
    #[must_use]
    pub fn bitrate_bps(&self) -> Option<u64> {
        match self {
            EncodeParameters::Bitrate { bitrate_bps } => Some(*bitrate_bps),
            EncodeParameters::ConstantQuality { .. } => None,
        }
    }

    #[must_use]
    pub fn quality_factor(&self) -> Option<u8> {
        match self {
            EncodeParameters::Bitrate { .. } => None,
            EncodeParameters::ConstantQuality { quality_factor } => Some(*quality_factor),
        }
    }
}

impl fmt::Display for EncodeParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeParameters::Bitrate { bitrate_bps } => {
                write!(f, "bitrate {}", format_bitrate(*bitrate_bps))
            }
            EncodeParameters::ConstantQuality { quality_factor } => {
                write!(f, "quality factor {quality_factor}")
            }
        }
    }
}

/// Average bitrate that would fill `max_output_size_bytes` over `duration_secs`.
///
/// Returns None when the duration is not a positive finite number.
#[must_use]
pub fn target_bitrate_bps(max_output_size_bytes: u64, duration_secs: f64) -> Option<u64> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return None;
    }
    let bitrate = (max_output_size_bytes as f64 * 8.0 / duration_secs).floor();
    Some((bitrate as u64).max(MIN_BITRATE_BPS))
}

/// Parameters for the first attempt of `request`.
///
/// Quality mode ignores the duration entirely. Bitrate mode needs it and
/// fails with [`CoreError::DurationUnknown`] without one.
pub fn initial_parameters(
    request: &CompressionRequest,
    duration_secs: Option<f64>,
) -> CoreResult<EncodeParameters> {
    if let Some(quality_factor) = request.quality_factor {
        return Ok(EncodeParameters::ConstantQuality { quality_factor });
    }

    duration_secs
        .and_then(|duration| target_bitrate_bps(request.max_output_size_bytes, duration))
        .map(|bitrate_bps| EncodeParameters::Bitrate { bitrate_bps })
        .ok_or_else(|| duration_unknown(&request.input_path))
}

/// Bitrate for the attempt after one that overshot, using the default factor.
#[must_use]
pub fn next_bitrate(current_bps: u64) -> u64 {
    next_bitrate_with_factor(current_bps, BITRATE_BACKOFF_FACTOR)
}

/// Bitrate for the attempt after one that overshot: `current * factor`,
/// rounded, never below [`MIN_BITRATE_BPS`].
#[must_use]
pub fn next_bitrate_with_factor(current_bps: u64, factor: f64) -> u64 {
    let next = (current_bps as f64 * factor).round();
    (next as u64).max(MIN_BITRATE_BPS)
}

fn duration_unknown(path: &Path) -> CoreError {
    CoreError::DurationUnknown(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEN_MIB: u64 = 10 * 1024 * 1024;

    #[test]
    fn test_target_bitrate_for_two_minutes_of_ten_mib() {
        assert_eq!(target_bitrate_bps(TEN_MIB, 120.0), Some(699_050));
    }

    #[test]
    fn test_target_bitrate_rejects_bad_durations() {
        assert_eq!(target_bitrate_bps(TEN_MIB, 0.0), None);
        assert_eq!(target_bitrate_bps(TEN_MIB, -5.0), None);
        assert_eq!(target_bitrate_bps(TEN_MIB, f64::NAN), None);
        assert_eq!(target_bitrate_bps(TEN_MIB, f64::INFINITY), None);
    }

    #[test]
    fn test_next_bitrate_backs_off_by_fifteen_percent() {
        assert_eq!(next_bitrate(699_050), 594_193);
        assert_eq!(next_bitrate(1_000_000), 850_000);
    }

    #[test]
    fn test_next_bitrate_never_reaches_zero() {
        assert_eq!(next_bitrate(1), MIN_BITRATE_BPS);
        assert_eq!(next_bitrate_with_factor(3, 0.1), MIN_BITRATE_BPS);
    }

    #[test]
    fn test_initial_parameters_bitrate_mode() {
        let request = CompressionRequest::new("in.mp4", "out.mp4", TEN_MIB);
        let params = initial_parameters(&request, Some(120.0)).unwrap();
        assert_eq!(params, EncodeParameters::Bitrate { bitrate_bps: 699_050 });
        assert_eq!(params.bitrate_bps(), Some(699_050));
        assert_eq!(params.quality_factor(), None);
    }

    #[test]
    fn test_initial_parameters_requires_duration_in_bitrate_mode() {
        let request = CompressionRequest::new("in.mp4", "out.mp4", TEN_MIB);
        assert!(matches!(
            initial_parameters(&request, None),
            Err(CoreError::DurationUnknown(_))
        ));
        assert!(matches!(
            initial_parameters(&request, Some(0.0)),
            Err(CoreError::DurationUnknown(_))
        ));
    }

    #[test]
    fn test_initial_parameters_quality_mode_ignores_duration() {
        let request =
            CompressionRequest::new("in.mp4", "out.mp4", TEN_MIB).with_quality_factor(Some(28));
        let params = initial_parameters(&request, None).unwrap();
        assert_eq!(params, EncodeParameters::ConstantQuality { quality_factor: 28 });
        assert_eq!(params.to_string(), "quality factor 28");
    }
}
