//! Poll loop on top of the queue service
//!
//! Receives batches until no message has arrived for the idle timeout or the
//! shutdown token is cancelled. Each message is handed to the handler and
//! deleted once the handler returns `Ok`; a handler error stops the loop and
//! leaves the message on the queue.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::QueueConfiguration;
use crate::error::QueueResult;
use crate::service::QueueService;
use crate::types::{QueueHandle, QueueMessage, ReceiveRequest};

/// Settings of one poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Parameters of each receive call
    pub request: ReceiveRequest,
    /// Stop after this long without a message; never stop when `None`
    pub idle_timeout: Option<Duration>,
}

impl From<&QueueConfiguration> for PollSettings {
    fn from(configuration: &QueueConfiguration) -> Self {
        Self {
            request: configuration.receive_request(),
            idle_timeout: configuration.idle_timeout,
        }
    }
}

/// Poll loop over one queue
pub struct Poller<'a> {
    queues: &'a dyn QueueService,
    queue: &'a QueueHandle,
    settings: PollSettings,
}

impl<'a> Poller<'a> {
    /// Creates a poller for `queue`
    #[must_use]
    pub const fn new(
        queues: &'a dyn QueueService,
        queue: &'a QueueHandle,
        settings: PollSettings,
    ) -> Self {
        Self {
            queues,
            queue,
            settings,
        }
    }

    /// Runs the loop and returns the number of messages handled
    ///
    /// # Errors
    ///
    /// Returns the first receive, delete or handler error
    pub async fn run<F, Fut>(
        &self,
        shutdown: &CancellationToken,
        mut handler: F,
    ) -> QueueResult<usize>
    where
        F: FnMut(QueueMessage) -> Fut,
        Fut: Future<Output = QueueResult<()>>,
    {
        let mut handled = 0;
        let mut last_message_at = Instant::now();

        loop {
            let batch = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    debug!("Poll loop for {} cancelled", self.queue.name);
                    break;
                }
                batch = self.queues.receive_messages(self.queue, &self.settings.request) => batch?,
            };

            if batch.is_empty() {
                if self.is_idle(last_message_at) {
                    debug!("Poll loop for {} idle, stopping", self.queue.name);
                    break;
                }
                // Short polling returns immediately
                tokio::task::yield_now().await;
                continue;
            }

            for message in batch {
                let receipt_handle = message.receipt_handle.clone();
                handler(message).await?;
                self.queues
                    .delete_message(self.queue, &receipt_handle)
                    .await?;
                handled += 1;
            }

            last_message_at = Instant::now();
        }

        Ok(handled)
    }

    fn is_idle(&self, last_message_at: Instant) -> bool {
        self.settings
            .idle_timeout
            .is_some_and(|idle_timeout| last_message_at.elapsed() >= idle_timeout)
    }
}
