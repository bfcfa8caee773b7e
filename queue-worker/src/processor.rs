//! Message processor used by the worker's receive loop

use async_trait::async_trait;
use queue_facade::{MessageProcessor, QueueHost, QueueMessage};
use tracing::info;

/// Logs every received message and acknowledges it
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProcessor;

impl QueueHost for LoggingProcessor {}

#[async_trait]
impl MessageProcessor for LoggingProcessor {
    async fn process_message(&self, message: &QueueMessage) -> anyhow::Result<()> {
        info!(
            message_id = %message.message_id,
            attributes = ?message.attributes,
            "Processing message: {}",
            message.body
        );
        Ok(())
    }
}
