//! Queue facade for a single managed message queue
//!
//! A host type gets a per-environment SQS queue it can send to, poll from,
//! count, and delete, plus optional failure alerts on an SNS topic and an
//! optional audit trail of every send and receive.
//!
//! ```no_run
//! use std::sync::Arc;
//! use queue_facade::{
//!     MessageProcessor, QueueContext, QueueFacade, QueueHost, QueueMessage, SendOptions,
//! };
//!
//! struct OrderEvents;
//!
//! impl QueueHost for OrderEvents {}
//!
//! #[async_trait::async_trait]
//! impl MessageProcessor for OrderEvents {
//!     async fn process_message(&self, message: &QueueMessage) -> anyhow::Result<()> {
//!         tracing::info!("order event: {}", message.body);
//!         Ok(())
//!     }
//! }
//!
//! # async fn run() -> queue_facade::QueueResult<()> {
//! let context = Arc::new(QueueContext::aws());
//! context
//!     .configure(|config| config.environment = Some("staging".to_string()))
//!     .await?;
//!
//! let queue = QueueFacade::new(context, OrderEvents);
//! queue.send("order-created", SendOptions::default()).await?;
//! let processed = queue.receive().await?;
//! # let _ = processed;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]

/// Audit trail of send and receive activity
pub mod audit;
/// Queue configuration
pub mod config;
/// Process-wide configuration holder and service access
pub mod context;
/// Error types for facade operations
pub mod error;
/// The queue facade and the host traits
pub mod facade;
/// Queue name derivation
pub mod naming;
/// Failure notification topics
pub mod notification;
/// Poll loop on top of the queue service
pub mod poller;
/// Queue and notification service abstractions and their AWS implementations
pub mod service;
/// Common types for queue operations
pub mod types;

pub use audit::{AuditAction, AuditEntry, AuditSink, TracingAuditSink};
pub use config::QueueConfiguration;
pub use context::QueueContext;
pub use error::{QueueError, QueueResult};
pub use facade::{MessageProcessor, QueueFacade, QueueHost};
pub use notification::FailureTopic;
pub use service::{
    NotificationService, QueueService, ServiceConnector, ServiceError, ServiceResult, Services,
};
pub use types::{
    PublishReceipt, QueueHandle, QueueMessage, QueueState, ReceiveRequest, SendOptions,
    SendOutcome, SendReceipt, TopicHandle,
};
