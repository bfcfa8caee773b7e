use std::collections::BTreeMap;

/// Opaque reference to a remote queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueHandle {
    /// Queue name the handle was resolved from
    pub name: String,
    /// Queue URL returned by the queue service
    pub url: String,
}

/// Opaque reference to a remote notification topic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicHandle {
    /// Topic name
    pub name: String,
    /// Topic ARN returned by the notification service
    pub arn: String,
}

/// A message delivered by the queue service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Message ID
    pub message_id: String,
    /// Receipt handle for acknowledging the message
    pub receipt_handle: String,
    /// The raw message body
    pub body: String,
    /// String message attributes sent alongside the body
    pub attributes: BTreeMap<String, String>,
}

/// Delivery options forwarded to the queue service as-is
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Seconds to delay delivery of the message
    pub delay_seconds: Option<i32>,
    /// Message group ID, required for FIFO queues
    pub message_group_id: Option<String>,
    /// Deduplication ID for FIFO queues without content-based deduplication
    pub message_deduplication_id: Option<String>,
    /// String message attributes
    pub attributes: BTreeMap<String, String>,
}

impl SendOptions {
    /// Sets the delivery delay
    #[must_use]
    pub const fn with_delay_seconds(mut self, delay_seconds: i32) -> Self {
        self.delay_seconds = Some(delay_seconds);
        self
    }

    /// Sets the FIFO message group ID
    #[must_use]
    pub fn with_message_group_id(mut self, message_group_id: impl Into<String>) -> Self {
        self.message_group_id = Some(message_group_id.into());
        self
    }

    /// Sets the FIFO deduplication ID
    #[must_use]
    pub fn with_deduplication_id(mut self, deduplication_id: impl Into<String>) -> Self {
        self.message_deduplication_id = Some(deduplication_id.into());
        self
    }

    /// Adds a string message attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// Parameters for a single receive call against the queue service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// Maximum number of messages to return (1-10 for SQS)
    pub max_messages: i32,
    /// Long-poll wait time in seconds
    pub wait_time_seconds: i32,
    /// Visibility timeout for received messages, queue default when `None`
    pub visibility_timeout: Option<i32>,
}

/// Response of a successful send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    /// Message ID assigned by the queue service
    pub message_id: String,
    /// Sequence number, only set for FIFO queues
    pub sequence_number: Option<String>,
}

/// Response of a successful publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Message ID assigned by the notification service
    pub message_id: String,
}

/// Result of a send through the facade
///
/// Service failures are not returned as errors. They are logged, optionally
/// alerted on the failure topic, and reported here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The queue service accepted the message
    Sent(SendReceipt),
    /// The queue service rejected the message
    Failed {
        /// Description of the service error
        error: String,
        /// Receipt of the failure alert, if one was published
        notification: Option<PublishReceipt>,
    },
}

impl SendOutcome {
    /// Whether the message reached the queue
    #[must_use]
    pub const fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    /// Whether a failure alert was published for this send
    #[must_use]
    pub const fn notified(&self) -> bool {
        matches!(
            self,
            Self::Failed {
                notification: Some(_),
                ..
            }
        )
    }

    /// The send receipt, if the message reached the queue
    #[must_use]
    pub const fn receipt(&self) -> Option<&SendReceipt> {
        match self {
            Self::Sent(receipt) => Some(receipt),
            Self::Failed { .. } => None,
        }
    }

    /// The error description, if the send failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Sent(_) => None,
            Self::Failed { error, .. } => Some(error),
        }
    }
}

/// Binding state of a facade's queue handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    /// No handle resolved yet
    Unbound,
    /// Handle resolved and cached
    Bound,
}
