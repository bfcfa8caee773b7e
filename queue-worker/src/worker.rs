//! Runs one command of the queue worker against its queue

use std::sync::Arc;

use anyhow::Context;
use queue_facade::{QueueContext, QueueFacade, SendOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::cli::{Cli, Command};
use crate::processor::LoggingProcessor;
use crate::types::Environment;

pub struct QueueWorker {
    queue: QueueFacade<LoggingProcessor>,
    shutdown_token: CancellationToken,
}

impl QueueWorker {
    /// Configures `context` from the command line and binds the worker's facade
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be configured
    pub async fn new(
        context: Arc<QueueContext>,
        cli: &Cli,
        environment: Environment,
    ) -> anyhow::Result<Self> {
        context
            .configure(|config| cli.apply(config, environment))
            .await
            .context("Failed to configure queue context")?;

        let queue = match &cli.queue_name {
            Some(base_name) => QueueFacade::with_base_name(context, LoggingProcessor, base_name),
            None => QueueFacade::new(context, LoggingProcessor),
        };

        Ok(Self {
            queue,
            shutdown_token: CancellationToken::new(),
        })
    }

    /// Token that stops a running receive loop
    #[must_use]
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// The facade the worker runs commands against
    #[must_use]
    pub const fn queue(&self) -> &QueueFacade<LoggingProcessor> {
        &self.queue
    }

    /// Runs `command` and logs its result
    ///
    /// # Errors
    ///
    /// Returns an error if the queue operation fails or a send is rejected
    pub async fn run(&self, command: &Command) -> anyhow::Result<()> {
        let queue_name = self.queue.queue_name()?.to_string();

        match command {
            Command::Send { message, .. } => {
                match self.queue.send(message, command.send_options()).await? {
                    SendOutcome::Sent(receipt) => {
                        info!("Sent message {} to {}", receipt.message_id, queue_name);
                    }
                    SendOutcome::Failed {
                        error,
                        notification,
                    } => {
                        error!(
                            notified = notification.is_some(),
                            "Failed to send message to {}: {}", queue_name, error
                        );
                        anyhow::bail!("Failed to send message to {queue_name}: {error}");
                    }
                }
            }
            Command::Receive => {
                info!("Receiving messages from {}", queue_name);
                let processed = self.queue.receive_until(&self.shutdown_token).await?;
                info!("Processed {} messages from {}", processed, queue_name);
            }
            Command::Count => {
                let count = self.queue.count().await?;
                info!("{} holds approximately {} messages", queue_name, count);
            }
            Command::Exists => {
                let exists = self.queue.exists().await?;
                info!("{} exists: {}", queue_name, exists);
            }
            Command::DeleteQueue => {
                self.queue.delete_queue().await?;
                info!("Deleted {}", queue_name);
            }
        }

        Ok(())
    }
}
