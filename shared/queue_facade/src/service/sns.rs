use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sns::Client as SnsClient;

use super::{NotificationService, ServiceError, ServiceResult};
use crate::types::{PublishReceipt, TopicHandle};

/// Notification service backed by AWS SNS
pub struct SnsNotificationService {
    sns_client: Arc<SnsClient>,
}

impl SnsNotificationService {
    /// Creates a new SNS notification service
    ///
    /// # Arguments
    ///
    /// * `sns_client` - Pre-configured SNS client
    #[must_use]
    pub const fn new(sns_client: Arc<SnsClient>) -> Self {
        Self { sns_client }
    }
}

#[async_trait]
impl NotificationService for SnsNotificationService {
    async fn create_topic(&self, name: &str) -> ServiceResult<TopicHandle> {
        // CreateTopic is idempotent and returns the ARN of an existing topic
        let result = self
            .sns_client
            .create_topic()
            .name(name)
            .send()
            .await
            .map_err(|e| ServiceError::request("CreateTopic", &e))?;

        let arn = result
            .topic_arn()
            .ok_or(ServiceError::MalformedResponse {
                operation: "CreateTopic",
                field: "TopicArn",
            })?
            .to_string();

        Ok(TopicHandle {
            name: name.to_string(),
            arn,
        })
    }

    async fn publish(
        &self,
        topic: &TopicHandle,
        message: &str,
        subject: &str,
    ) -> ServiceResult<PublishReceipt> {
        let result = self
            .sns_client
            .publish()
            .topic_arn(&topic.arn)
            .message(message)
            .subject(subject)
            .send()
            .await
            .map_err(|e| ServiceError::request("Publish", &e))?;

        Ok(PublishReceipt {
            message_id: result
                .message_id()
                .map(std::string::ToString::to_string)
                .unwrap_or_default(),
        })
    }
}
