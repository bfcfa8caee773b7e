//! The queue facade
//!
//! [`QueueFacade`] gives a host type one queue named after the host and the
//! configured environment. Any [`QueueHost`] can send, count, look up and
//! delete its queue; receiving additionally requires a [`MessageProcessor`].

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::audit::AuditEntry;
use crate::config::QueueConfiguration;
use crate::context::QueueContext;
use crate::error::{QueueError, QueueResult};
use crate::naming;
use crate::notification::{send_failure_message, FailureTopic};
use crate::poller::{PollSettings, Poller};
use crate::types::{
    PublishReceipt, QueueHandle, QueueMessage, QueueState, SendOptions, SendOutcome, SendReceipt,
};

/// A type that owns a queue
pub trait QueueHost: Send + Sync + 'static {
    /// Explicit queue base name; derived from the type path when `None`
    const QUEUE_NAME: Option<&'static str> = None;
}

/// A queue host that consumes its queue
#[async_trait]
pub trait MessageProcessor: QueueHost {
    /// Handles one received message
    ///
    /// The message is deleted from the queue once this returns `Ok`.
    ///
    /// # Errors
    ///
    /// An error stops the poll loop and leaves the message on the queue for
    /// redelivery.
    async fn process_message(&self, message: &QueueMessage) -> anyhow::Result<()>;
}

/// Producer/consumer access to the queue of one host
pub struct QueueFacade<H> {
    context: Arc<QueueContext>,
    host: H,
    base_name: Option<String>,
    queue_name: once_cell::sync::OnceCell<String>,
    queue: RwLock<Option<QueueHandle>>,
}

impl<H: QueueHost> QueueFacade<H> {
    /// Creates an unbound facade for `host`
    #[must_use]
    pub fn new(context: Arc<QueueContext>, host: H) -> Self {
        Self {
            context,
            host,
            base_name: None,
            queue_name: once_cell::sync::OnceCell::new(),
            queue: RwLock::new(None),
        }
    }

    /// Creates an unbound facade with an explicit queue base name
    #[must_use]
    pub fn with_base_name(
        context: Arc<QueueContext>,
        host: H,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            base_name: Some(base_name.into()),
            ..Self::new(context, host)
        }
    }

    /// The host this facade serves
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The queue context this facade was created from
    #[must_use]
    pub const fn context(&self) -> &Arc<QueueContext> {
        &self.context
    }

    /// Queue name without the environment suffix
    #[must_use]
    pub fn base_name(&self) -> String {
        self.base_name
            .clone()
            .or_else(|| H::QUEUE_NAME.map(ToString::to_string))
            .unwrap_or_else(naming::type_base_name::<H>)
    }

    /// Full queue name, `<base name>_<environment>`
    ///
    /// Computed once; later configuration changes do not rename the queue.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotConfigured` before configuration and
    /// `QueueError::EnvironmentUndefined` without an environment tag
    pub fn queue_name(&self) -> QueueResult<&str> {
        self.queue_name
            .get_or_try_init(|| {
                let configuration = self.context.configuration()?;
                let environment = configuration.environment()?;
                Ok(naming::queue_name(&self.base_name(), environment))
            })
            .map(String::as_str)
    }

    /// Whether the queue handle has been resolved
    pub async fn state(&self) -> QueueState {
        if self.queue.read().await.is_some() {
            QueueState::Bound
        } else {
            QueueState::Unbound
        }
    }

    /// Returns the queue handle, creating the queue on first use
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotConfigured`, `QueueError::EnvironmentUndefined`
    /// or the queue service error
    pub async fn queue(&self) -> QueueResult<QueueHandle> {
        let cached = self.queue.read().await.clone();
        if let Some(handle) = cached {
            return Ok(handle);
        }

        let queue_name = self.queue_name()?;
        let services = self.context.services().await?;

        let mut slot = self.queue.write().await;
        if let Some(handle) = slot.as_ref() {
            return Ok(handle.clone());
        }

        let handle = services.queues.create_queue(queue_name).await?;
        info!("Bound queue {} at {}", handle.name, handle.url);
        *slot = Some(handle.clone());

        Ok(handle)
    }

    /// Sends a message to the queue
    ///
    /// Service failures do not return an error. They are logged, published to
    /// the `send_message_failure` topic when notifications are enabled, and
    /// reported as `SendOutcome::Failed`. Every attempt is audited when an
    /// audit sink is configured.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotConfigured` before configuration and
    /// `QueueError::EnvironmentUndefined` without an environment tag
    pub async fn send(&self, message: &str, options: SendOptions) -> QueueResult<SendOutcome> {
        let configuration = self.context.configuration()?;
        let queue_name = self.queue_name()?;

        let (outcome, error) = match self.try_send(message, &options).await {
            Ok(receipt) => (SendOutcome::Sent(receipt), None),
            Err(err @ (QueueError::NotConfigured | QueueError::EnvironmentUndefined)) => {
                return Err(err);
            }
            Err(err) => {
                let error = match err {
                    QueueError::Service(service_error) => service_error.to_string(),
                    other => other.to_string(),
                };
                let notification = self
                    .report_send_failure(&configuration, queue_name, &error)
                    .await;

                (
                    SendOutcome::Failed {
                        error: error.clone(),
                        notification,
                    },
                    Some(error),
                )
            }
        };

        self.audit(&configuration, AuditEntry::send(queue_name, message, error))
            .await;

        Ok(outcome)
    }

    /// Returns the approximate number of messages on the queue
    ///
    /// # Errors
    ///
    /// Returns configuration errors or the queue service error
    pub async fn count(&self) -> QueueResult<u64> {
        let queue = self.queue().await?;
        let count = self
            .context
            .services()
            .await?
            .queues
            .approximate_message_count(&queue)
            .await?;

        Ok(count)
    }

    /// Whether a queue with this facade's name exists
    ///
    /// Any lookup failure counts as "does not exist"; use
    /// [`Self::lookup_queue`] to tell a missing queue from a failing service.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotConfigured` before configuration and
    /// `QueueError::EnvironmentUndefined` without an environment tag
    pub async fn exists(&self) -> QueueResult<bool> {
        match self.lookup_queue().await {
            Ok(found) => Ok(found),
            Err(err @ (QueueError::NotConfigured | QueueError::EnvironmentUndefined)) => Err(err),
            Err(err) => {
                warn!(
                    "Treating lookup failure of {} as missing queue: {}",
                    self.queue_name()?,
                    err
                );
                Ok(false)
            }
        }
    }

    /// Looks up the queue by name without creating it
    ///
    /// # Errors
    ///
    /// Returns configuration errors or any queue service error other than
    /// "queue not found"
    pub async fn lookup_queue(&self) -> QueueResult<bool> {
        let queue_name = self.queue_name()?;

        match self
            .context
            .services()
            .await?
            .queues
            .get_queue(queue_name)
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes the queue and drops the cached handle
    ///
    /// The next operation that needs the queue creates it again.
    ///
    /// # Errors
    ///
    /// Returns configuration errors or the queue service error
    pub async fn delete_queue(&self) -> QueueResult<()> {
        let queue = self.queue().await?;

        self.context
            .services()
            .await?
            .queues
            .delete_queue(&queue)
            .await?;

        *self.queue.write().await = None;
        info!("Deleted queue {}", queue.name);

        Ok(())
    }

    async fn try_send(&self, message: &str, options: &SendOptions) -> QueueResult<SendReceipt> {
        let queue = self.queue().await?;

        let receipt = self
            .context
            .services()
            .await?
            .queues
            .send_message(&queue, message, options)
            .await?;

        Ok(receipt)
    }

    async fn report_send_failure(
        &self,
        configuration: &QueueConfiguration,
        queue_name: &str,
        error: &str,
    ) -> Option<PublishReceipt> {
        let alert = send_failure_message(queue_name, Utc::now(), error);
        error!("{alert}");

        if !configuration.sns_notifications {
            return None;
        }

        match self
            .context
            .notify_failure(FailureTopic::SendMessageFailure, &alert)
            .await
        {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                error!("Failed to publish send failure alert for {queue_name}: {e}");
                None
            }
        }
    }

    async fn audit(&self, configuration: &QueueConfiguration, entry: AuditEntry) {
        let Some(sink) = &configuration.audit_sink else {
            return;
        };

        let action = entry.action;
        let queue_name = entry.queue_name.clone();
        if let Err(e) = sink.record(entry).await {
            warn!("Failed to record {action} audit entry for {queue_name}: {e:#}");
        }
    }
}

impl<H: MessageProcessor> QueueFacade<H> {
    /// Polls the queue and hands every message to the host
    ///
    /// Returns once no message has arrived within the configured idle
    /// timeout, with the number of messages processed.
    ///
    /// Only hosts implementing [`MessageProcessor`] can receive:
    ///
    /// ```compile_fail
    /// use queue_facade::{QueueFacade, QueueHost};
    ///
    /// struct ProducerOnly;
    /// impl QueueHost for ProducerOnly {}
    ///
    /// async fn drain(queue: QueueFacade<ProducerOnly>) {
    ///     let _ = queue.receive().await;
    /// }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns configuration errors, queue service errors, or
    /// `QueueError::Processing` for the first message the host fails on
    pub async fn receive(&self) -> QueueResult<usize> {
        self.receive_until(&CancellationToken::new()).await
    }

    /// Like [`Self::receive`], but also stops when `shutdown` is cancelled
    ///
    /// # Errors
    ///
    /// Same as [`Self::receive`]
    pub async fn receive_until(&self, shutdown: &CancellationToken) -> QueueResult<usize> {
        let configuration = self.context.configuration()?;
        let queue = self.queue().await?;
        let queue_name = self.queue_name()?;
        let services = self.context.services().await?;

        let configuration = configuration.as_ref();
        let poller = Poller::new(
            services.queues.as_ref(),
            &queue,
            PollSettings::from(configuration),
        );

        let processed = poller
            .run(shutdown, move |message| async move {
                self.handle_message(configuration, queue_name, message)
                    .await
            })
            .await?;

        if configuration.debug {
            info!("Processed {processed} messages from {queue_name}");
        }

        Ok(processed)
    }

    async fn handle_message(
        &self,
        configuration: &QueueConfiguration,
        queue_name: &str,
        message: QueueMessage,
    ) -> QueueResult<()> {
        if configuration.debug {
            info!("Message received for {queue_name}");
            info!("Message body: {}", message.body);
        }

        self.audit(configuration, AuditEntry::receive(queue_name, &message.body))
            .await;

        self.host
            .process_message(&message)
            .await
            .map_err(|e| QueueError::Processing {
                queue_name: queue_name.to_string(),
                message_id: message.message_id.clone(),
                source: e.into(),
            })
    }
}
