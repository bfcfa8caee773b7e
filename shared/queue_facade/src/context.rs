//! Queue context
//!
//! One [`QueueContext`] is created per process and shared by every facade
//! through an `Arc`. It owns the configuration, the lazily connected service
//! clients and the failure notification topics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use strum::IntoEnumIterator;
use tokio::sync::OnceCell;
use tracing::info;

use crate::config::QueueConfiguration;
use crate::error::{QueueError, QueueResult};
use crate::notification::FailureTopic;
use crate::service::{AwsConnector, ServiceConnector, Services};
use crate::types::{PublishReceipt, TopicHandle};

/// Process-wide queue configuration and service access
pub struct QueueContext {
    connector: Box<dyn ServiceConnector>,
    configuration: RwLock<Option<Arc<QueueConfiguration>>>,
    services: OnceCell<Services>,
    topics: Mutex<HashMap<FailureTopic, TopicHandle>>,
}

impl QueueContext {
    /// Creates an unconfigured context that connects through `connector`
    #[must_use]
    pub fn new(connector: impl ServiceConnector + 'static) -> Self {
        Self {
            connector: Box::new(connector),
            configuration: RwLock::new(None),
            services: OnceCell::new(),
            topics: Mutex::new(HashMap::new()),
        }
    }

    /// Creates an unconfigured context backed by SQS and SNS
    #[must_use]
    pub fn aws() -> Self {
        Self::new(AwsConnector)
    }

    /// Creates the configuration if absent and applies `mutator` to it
    ///
    /// When failure notifications are enabled, every failure topic is
    /// provisioned right away. Topic creation is create-or-get, so calling
    /// this more than once is safe.
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Service` if the services cannot be connected or a
    /// failure topic cannot be created
    pub async fn configure<F>(&self, mutator: F) -> QueueResult<()>
    where
        F: FnOnce(&mut QueueConfiguration),
    {
        let configuration = {
            let mut current = self
                .configuration
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            let mut configuration = current.as_deref().cloned().unwrap_or_default();
            mutator(&mut configuration);

            let configuration = Arc::new(configuration);
            *current = Some(Arc::clone(&configuration));
            configuration
        };

        if configuration.sns_notifications {
            for topic in FailureTopic::iter() {
                let handle = self.failure_topic(topic).await?;
                info!("Provisioned failure topic {} ({})", handle.name, handle.arn);
            }
        }

        Ok(())
    }

    /// Returns the current configuration
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotConfigured` if `configure` has not been called
    pub fn configuration(&self) -> QueueResult<Arc<QueueConfiguration>> {
        self.configuration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(QueueError::NotConfigured)
    }

    /// Whether `configure` has been called
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.configuration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the service clients, connecting them on first use
    ///
    /// # Errors
    ///
    /// Returns `QueueError::NotConfigured` before configuration and
    /// `QueueError::Service` if the connector fails
    pub async fn services(&self) -> QueueResult<&Services> {
        let configuration = self.configuration()?;

        let services = self
            .services
            .get_or_try_init(|| async { self.connector.connect(&configuration).await })
            .await?;

        Ok(services)
    }

    /// Returns the topic for a failure category, creating it on first use
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Service` if the topic cannot be created
    pub async fn failure_topic(&self, topic: FailureTopic) -> QueueResult<TopicHandle> {
        if let Some(handle) = self.cached_topic(topic) {
            return Ok(handle);
        }

        let handle = self
            .services()
            .await?
            .notifications
            .create_topic(topic.topic_name())
            .await?;

        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(topic, handle.clone());

        Ok(handle)
    }

    /// Publishes an alert to the topic of a failure category
    ///
    /// # Errors
    ///
    /// Returns `QueueError::Service` if the topic cannot be resolved or the
    /// publish fails
    pub async fn notify_failure(
        &self,
        topic: FailureTopic,
        message: &str,
    ) -> QueueResult<PublishReceipt> {
        let handle = self.failure_topic(topic).await?;

        let receipt = self
            .services()
            .await?
            .notifications
            .publish(&handle, message, topic.subject())
            .await?;

        Ok(receipt)
    }

    fn cached_topic(&self, topic: FailureTopic) -> Option<TopicHandle> {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .cloned()
    }
}
