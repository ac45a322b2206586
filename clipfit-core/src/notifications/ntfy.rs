// ============================================================================
// clipfit-core/src/notifications/ntfy.rs
// ============================================================================
//
// NTFY IMPLEMENTATION: Notification Implementation Using ntfy.sh
//
// Sends notifications to an ntfy topic given as a single URL such as
// "https://ntfy.sh/my_topic". Uses the blocking dispatcher, so sending
// happens on the caller's thread.

use crate::error::{CoreError, CoreResult};
use crate::notifications::{NotificationSender, NotificationType};

use ntfy::DispatcherBuilder;
use ntfy::payload::{Payload, Priority as NtfyPriority};

/// Sends notifications to the ntfy.sh service.
///
/// # Examples
///
/// ```rust,no_run
/// use clipfit_core::notifications::{NotificationSender, NotificationType, NtfyNotificationSender};
/// use std::path::PathBuf;
///
/// let sender = NtfyNotificationSender::new("https://ntfy.sh/your_topic").unwrap();
/// let notification = NotificationType::CompressCancelled {
///     input_path: PathBuf::from("/path/to/input.mp4"),
/// };
/// sender.send_notification(&notification).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NtfyNotificationSender {
    topic_url: String,
    base_url: String,
    topic: String,
}

impl NtfyNotificationSender {
    /// Creates a sender for `topic_url` (`https://<host>/<topic>`).
    pub fn new(topic_url: &str) -> CoreResult<Self> {
        let (base_url, topic) = split_topic_url(topic_url)?;
        Ok(Self {
            topic_url: topic_url.to_string(),
            base_url,
            topic,
        })
    }

    #[must_use]
    pub fn topic_url(&self) -> &str {
        &self.topic_url
    }
}

impl NotificationSender for NtfyNotificationSender {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()> {
        let dispatcher = DispatcherBuilder::new(&self.base_url)
            .build_blocking()
            .map_err(|e| {
                CoreError::NotificationError(format!(
                    "Failed to build ntfy dispatcher for {}: {}",
                    self.base_url, e
                ))
            })?;

        let priority = map_priority(notification.get_priority()).unwrap_or_else(|| {
            log::warn!(
                "Invalid ntfy priority value provided: {}",
                notification.get_priority()
            );
            NtfyPriority::Default
        });

        let payload = Payload::new(&self.topic)
            .message(notification.get_message())
            .title(notification.get_title())
            .priority(priority)
            .tags(vec!["clipfit".to_string(), notification.tag().to_string()]);

        dispatcher.send(&payload).map_err(|e| {
            CoreError::NotificationError(format!(
                "Failed to send ntfy notification to {}: {}",
                self.topic_url, e
            ))
        })?;
        log::debug!("Sent ntfy notification to {}", self.topic_url);
        Ok(())
    }
}

/// Splits `https://host/topic` into (`https://host`, `topic`).
fn split_topic_url(topic_url: &str) -> CoreResult<(String, String)> {
    let after_scheme = topic_url.strip_prefix("https://").ok_or_else(|| {
        CoreError::NotificationError(format!(
            "Invalid ntfy topic URL '{topic_url}': must start with https://"
        ))
    })?;

    let (host, topic) = after_scheme.split_once('/').unwrap_or((after_scheme, ""));
    if host.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{topic_url}' must have a non-empty host"
        )));
    }
    let topic = topic.trim_end_matches('/');
    if topic.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{topic_url}' is missing topic path"
        )));
    }

    Ok((format!("https://{host}"), topic.to_string()))
}

/// Maps a numeric priority value (1-5) to the ntfy priority.
fn map_priority(p: u8) -> Option<NtfyPriority> {
    match p {
        1 => Some(NtfyPriority::Min),
        2 => Some(NtfyPriority::Low),
        3 => Some(NtfyPriority::Default),
        4 => Some(NtfyPriority::High),
        5 => Some(NtfyPriority::Max),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_topic_url() {
        assert_eq!(
            split_topic_url("https://ntfy.sh/clips").unwrap(),
            ("https://ntfy.sh".to_string(), "clips".to_string())
        );
        assert_eq!(
            split_topic_url("https://push.example.com/team/").unwrap(),
            ("https://push.example.com".to_string(), "team".to_string())
        );
    }

    #[test]
    fn test_invalid_topic_urls() {
        assert!(NtfyNotificationSender::new("http://ntfy.sh/clips").is_err());
        assert!(NtfyNotificationSender::new("https://ntfy.sh").is_err());
        assert!(NtfyNotificationSender::new("https:///clips").is_err());
        assert!(NtfyNotificationSender::new("ntfy.sh/clips").is_err());
    }

    #[test]
    fn test_map_priority() {
        assert!(map_priority(0).is_none());
        assert!(map_priority(6).is_none());
        assert!(map_priority(5).is_some());
    }
}
