use chrono::{DateTime, Utc};
use strum::{Display, EnumIter, IntoStaticStr};

/// Well-known failure categories, each published to its own topic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FailureTopic {
    /// A message could not be sent to its queue
    SendMessageFailure,
}

impl FailureTopic {
    /// Topic name on the notification service
    #[must_use]
    pub fn topic_name(self) -> &'static str {
        self.into()
    }

    /// Fixed subject line of alerts on this topic
    #[must_use]
    pub const fn subject(self) -> &'static str {
        match self {
            Self::SendMessageFailure => "QueueFacade: Send Message Failure",
        }
    }
}

/// Alert text for a failed send, also used as the error log line
#[must_use]
pub fn send_failure_message(queue_name: &str, at: DateTime<Utc>, error: &str) -> String {
    format!(
        "There was an error when sending an item to {queue_name} at {}. Error: {error}",
        at.to_rfc3339()
    )
}
