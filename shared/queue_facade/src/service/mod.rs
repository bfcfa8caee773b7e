//! Queue and notification service seams
//!
//! The facade only talks to these traits. The AWS implementations live in
//! [`sqs`], [`sns`] and [`aws`]; tests plug in in-memory services through
//! [`Services`], which is itself a [`ServiceConnector`].

/// Connector that builds AWS clients from the queue configuration
pub mod aws;
/// SNS backed notification service
pub mod sns;
/// SQS backed queue service
pub mod sqs;

use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sqs::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

use crate::config::QueueConfiguration;
use crate::types::{
    PublishReceipt, QueueHandle, QueueMessage, ReceiveRequest, SendOptions, SendReceipt,
    TopicHandle,
};

pub use aws::AwsConnector;
pub use sns::SnsNotificationService;
pub use sqs::SqsQueueService;

/// Result type alias for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error types for queue and notification service calls
#[derive(Error, Debug)]
pub enum ServiceError {
    /// No queue exists under the given name
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    /// The service rejected or failed the request
    #[error("{operation} failed: {message}")]
    Request {
        /// Name of the failed service operation
        operation: &'static str,
        /// Error description including the service error chain
        message: String,
        /// Whether the service answered with a 5xx status
        upstream: bool,
    },

    /// The service answered without a field the facade depends on
    #[error("Malformed {operation} response: missing {field}")]
    MalformedResponse {
        /// Name of the service operation
        operation: &'static str,
        /// Missing response field
        field: &'static str,
    },

    /// The request could not be built from the given options
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ServiceError {
    /// Builds a request error from an AWS SDK error
    pub(crate) fn request<E>(operation: &'static str, err: &SdkError<E>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Request {
            operation,
            message: DisplayErrorContext(err).to_string(),
            upstream: Self::check_sdk_error_status(err),
        }
    }

    /// Checks if this error represents an upstream (5xx) error
    #[must_use]
    pub const fn is_upstream_error(&self) -> bool {
        matches!(self, Self::Request { upstream: true, .. })
    }

    /// Checks if this error means the queue does not exist
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::QueueNotFound(_))
    }

    fn check_sdk_error_status<E>(sdk_err: &SdkError<E>) -> bool {
        if let SdkError::ServiceError(err) = sdk_err {
            let raw = err.raw();
            let status = raw.status();
            return status.as_u16() >= 500;
        }
        false
    }
}

/// Managed message queue operations used by the facade
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Creates the queue, or returns the existing queue with that name
    async fn create_queue(&self, name: &str) -> ServiceResult<QueueHandle>;

    /// Looks up an existing queue by name
    ///
    /// Returns `ServiceError::QueueNotFound` when no such queue exists.
    async fn get_queue(&self, name: &str) -> ServiceResult<QueueHandle>;

    /// Sends a message body with delivery options
    async fn send_message(
        &self,
        queue: &QueueHandle,
        body: &str,
        options: &SendOptions,
    ) -> ServiceResult<SendReceipt>;

    /// Receives up to `request.max_messages` messages, long-polling for `request.wait_time_seconds`
    async fn receive_messages(
        &self,
        queue: &QueueHandle,
        request: &ReceiveRequest,
    ) -> ServiceResult<Vec<QueueMessage>>;

    /// Removes a processed message from the queue
    async fn delete_message(&self, queue: &QueueHandle, receipt_handle: &str)
        -> ServiceResult<()>;

    /// Returns the approximate number of visible messages
    async fn approximate_message_count(&self, queue: &QueueHandle) -> ServiceResult<u64>;

    /// Deletes the queue
    async fn delete_queue(&self, queue: &QueueHandle) -> ServiceResult<()>;
}

/// Managed publish/subscribe operations used for failure alerts
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// Creates the topic, or returns the existing topic with that name
    async fn create_topic(&self, name: &str) -> ServiceResult<TopicHandle>;

    /// Publishes a message with a subject line to the topic
    async fn publish(
        &self,
        topic: &TopicHandle,
        message: &str,
        subject: &str,
    ) -> ServiceResult<PublishReceipt>;
}

/// The pair of service clients a queue context works with
#[derive(Clone)]
pub struct Services {
    /// Queue service client
    pub queues: Arc<dyn QueueService>,
    /// Notification service client
    pub notifications: Arc<dyn NotificationService>,
}

impl Services {
    /// Bundles already constructed service clients
    #[must_use]
    pub const fn new(
        queues: Arc<dyn QueueService>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            queues,
            notifications,
        }
    }
}

/// Builds service clients from the queue configuration on first use
#[async_trait]
pub trait ServiceConnector: Send + Sync {
    /// Connects the queue and notification services
    async fn connect(&self, configuration: &QueueConfiguration) -> ServiceResult<Services>;
}

#[async_trait]
impl ServiceConnector for Services {
    async fn connect(&self, _configuration: &QueueConfiguration) -> ServiceResult<Services> {
        Ok(self.clone())
    }
}
