//! Progress reporting for encode attempts.
//!
//! The core never renders progress itself. Each job takes a callback that
//! receives [`ProgressEvent`]s while an attempt runs; front ends turn those
//! into a progress bar, a percentage line, or nothing at all.

pub mod ffmpeg_handler;

use serde::Serialize;

/// Completion of the running attempt.
///
/// `fraction` is always within [0, 1] and never decreases within one
/// attempt. It restarts at 0 when a retry begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProgressEvent {
    /// Zero-based index of the attempt the event belongs to.
    pub attempt_index: u32,
    /// Elapsed output time divided by the source duration.
    pub fraction: f64,
}

impl ProgressEvent {
    /// Creates an event, clamping `fraction` into [0, 1].
    #[must_use]
    pub fn new(attempt_index: u32, fraction: f64) -> Self {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            attempt_index,
            fraction,
        }
    }

    /// Completion as a percentage in 0..=100.
    #[must_use]
    pub fn percent(&self) -> f64 {
        self.fraction * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_clamps_fraction() {
        assert_eq!(ProgressEvent::new(0, 1.7).fraction, 1.0);
        assert_eq!(ProgressEvent::new(0, -0.2).fraction, 0.0);
        assert_eq!(ProgressEvent::new(0, f64::NAN).fraction, 0.0);
    }

    #[test]
    fn test_percent() {
        let event = ProgressEvent::new(3, 0.25);
        assert_eq!(event.attempt_index, 3);
        assert_eq!(event.percent(), 25.0);
    }
}
