// ============================================================================
// clipfit-cli/src/progress.rs
// ============================================================================
//
// PROGRESS REPORTING: Terminal progress bar for compression attempts
//
// Core reports a fraction in [0, 1] per attempt and resets it to 0 when a
// new attempt starts. The bar is redrawn from those events; the attempt
// number is shown in the prefix so a reset reads as a new pass rather than
// progress going backwards.

use clipfit_core::ProgressEvent;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

const BAR_LENGTH: u64 = 1000;

/// Progress bar driven by [`ProgressEvent`]s.
///
/// A hidden bar is used when stderr is not a terminal or when JSON output
/// was requested, so callers never need to branch.
#[derive(Clone)]
pub struct CliProgress {
    bar: ProgressBar,
    max_attempts: u32,
}

impl CliProgress {
    pub fn new(enabled: bool, max_attempts: u32) -> Self {
        let bar = if enabled {
            ProgressBar::with_draw_target(Some(BAR_LENGTH), ProgressDrawTarget::stderr())
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::with_template(
            "{prefix:.cyan.bold} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
        bar.set_style(style);
        bar.set_length(BAR_LENGTH);
        Self { bar, max_attempts }
    }

    /// Whether the bar draws anything.
    pub fn is_visible(&self) -> bool {
        !self.bar.is_hidden()
    }

    pub fn update(&self, event: &ProgressEvent) {
        self.bar.set_prefix(format!(
            "Attempt {}/{}",
            event.attempt_index + 1,
            self.max_attempts
        ));
        self.bar.set_position(position_for(event.fraction));
        self.bar.set_message(format!("{:5.1}%", event.percent()));
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

/// Maps a fraction onto the bar's fixed length.
fn position_for(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * BAR_LENGTH as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_for() {
        assert_eq!(position_for(0.0), 0);
        assert_eq!(position_for(0.5), 500);
        assert_eq!(position_for(1.0), BAR_LENGTH);
        assert_eq!(position_for(2.0), BAR_LENGTH);
    }

    #[test]
    fn test_hidden_bar_accepts_updates() {
        let progress = CliProgress::new(false, 10);
        assert!(!progress.is_visible());
        progress.update(&ProgressEvent::new(0, 0.25));
        progress.update(&ProgressEvent::new(1, 0.0));
        progress.finish();
    }
}
