use crate::service::ServiceError;
use thiserror::Error;

/// Result type alias for facade operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Error types for facade operations
#[derive(Error, Debug)]
pub enum QueueError {
    /// No configuration has been established on the queue context
    #[error("Queue configuration has not been established, call `configure` first")]
    NotConfigured,

    /// The environment tag is missing, so no queue name can be derived
    #[error("Queue environment is not defined")]
    EnvironmentUndefined,

    /// The queue or notification service failed
    #[error("Queue service error: {0}")]
    Service(#[from] ServiceError),

    /// A message processor returned an error; the message stays on the queue
    #[error("Failed to process message {message_id} from {queue_name}: {source}")]
    Processing {
        /// Queue the message was received from
        queue_name: String,
        /// ID of the message that failed
        message_id: String,
        /// Error returned by the processor
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl QueueError {
    /// Checks if this error represents an upstream (5xx) service error
    #[must_use]
    pub const fn is_upstream_error(&self) -> bool {
        match self {
            Self::Service(err) => err.is_upstream_error(),
            _ => false,
        }
    }
}
