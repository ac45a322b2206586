// ============================================================================
// clipfit-core/src/notifications/mod.rs
// ============================================================================
//
// NOTIFICATIONS: Task-complete push notifications
//
// A finished, failed or cancelled compression can be announced through a
// NotificationSender. The ntfy.sh backend lives in `ntfy`; callers that do
// not want notifications use NullNotificationSender.

mod ntfy;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreResult;
use crate::utils::format_bytes;

pub use ntfy::NtfyNotificationSender;

/// Notifications the compressor front ends send.
#[derive(Debug, Clone)]
pub enum NotificationType {
    /// A job finished and left an output file
    CompressComplete {
        input_path: PathBuf,
        output_path: PathBuf,
        output_size: u64,
        /// False when the size limit could not be reached
        within_budget: bool,
        elapsed: Duration,
    },

    /// A job failed
    CompressError { input_path: PathBuf, message: String },

    /// A job was stopped by the user
    CompressCancelled { input_path: PathBuf },
}

impl NotificationType {
    /// Gets the title for this notification type.
    #[must_use]
    pub fn get_title(&self) -> String {
        match self {
            NotificationType::CompressComplete { within_budget: true, .. } => {
                "Compression Complete".to_string()
            }
            NotificationType::CompressComplete { .. } => "Compression Over Limit".to_string(),
            NotificationType::CompressError { .. } => "Compression Error".to_string(),
            NotificationType::CompressCancelled { .. } => "Compression Cancelled".to_string(),
        }
    }

    /// Gets the message body for this notification type.
    #[must_use]
    pub fn get_message(&self) -> String {
        match self {
            NotificationType::CompressComplete {
                input_path,
                output_path,
                output_size,
                within_budget,
                elapsed,
            } => {
                let mut message = format!(
                    "{} -> {} ({}) in {}s",
                    display_name(input_path),
                    display_name(output_path),
                    format_bytes(*output_size),
                    elapsed.as_secs()
                );
                if !within_budget {
                    message.push_str(", still above the size limit");
                }
                message
            }
            NotificationType::CompressError { input_path, message } => {
                format!("Error compressing {}: {}", display_name(input_path), message)
            }
            NotificationType::CompressCancelled { input_path } => {
                format!("Stopped compressing {}", display_name(input_path))
            }
        }
    }

    /// Gets the priority level (1-5, with 5 being highest).
    #[must_use]
    pub fn get_priority(&self) -> u8 {
        match self {
            NotificationType::CompressComplete { within_budget: true, .. } => 3,
            NotificationType::CompressComplete { .. } => 4,
            NotificationType::CompressError { .. } => 5,
            NotificationType::CompressCancelled { .. } => 2,
        }
    }

    /// Short tag identifying the notification kind.
    #[must_use]
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationType::CompressComplete { .. } => "complete",
            NotificationType::CompressError { .. } => "error",
            NotificationType::CompressCancelled { .. } => "cancelled",
        }
    }
}

fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Trait for sending notifications.
pub trait NotificationSender: Send + Sync {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()>;
}

/// No-op sender used when notifications are not configured.
#[derive(Debug, Clone, Default)]
pub struct NullNotificationSender;

impl NotificationSender for NullNotificationSender {
    fn send_notification(&self, _notification: &NotificationType) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_message() {
        let notification = NotificationType::CompressComplete {
            input_path: PathBuf::from("/videos/trip.mov"),
            output_path: PathBuf::from("/out/trip-compressed.mp4"),
            output_size: 5 * 1024 * 1024,
            within_budget: true,
            elapsed: Duration::from_secs(42),
        };
        assert_eq!(notification.get_title(), "Compression Complete");
        assert_eq!(
            notification.get_message(),
            "trip.mov -> trip-compressed.mp4 (5.00 MiB) in 42s"
        );
        assert_eq!(notification.get_priority(), 3);
        assert_eq!(notification.tag(), "complete");
    }

    #[test]
    fn test_over_budget_is_flagged() {
        let notification = NotificationType::CompressComplete {
            input_path: PathBuf::from("a.mp4"),
            output_path: PathBuf::from("a-compressed.mp4"),
            output_size: 100,
            within_budget: false,
            elapsed: Duration::from_secs(1),
        };
        assert_eq!(notification.get_title(), "Compression Over Limit");
        assert!(notification.get_message().ends_with("still above the size limit"));
    }

    #[test]
    fn test_error_message() {
        let notification = NotificationType::CompressError {
            input_path: PathBuf::from("/videos/broken.mkv"),
            message: "Encoder failed".to_string(),
        };
        assert_eq!(notification.get_message(), "Error compressing broken.mkv: Encoder failed");
        assert_eq!(notification.get_priority(), 5);
    }

    #[test]
    fn test_null_sender_accepts_everything() {
        let sender = NullNotificationSender;
        let notification = NotificationType::CompressCancelled {
            input_path: PathBuf::from("x.mp4"),
        };
        assert!(sender.send_notification(&notification).is_ok());
    }
}
