use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sns::Client as SnsClient;
use aws_sdk_sqs::Client as SqsClient;
use tracing::info;

use super::{ServiceConnector, ServiceResult, Services, SnsNotificationService, SqsQueueService};
use crate::config::QueueConfiguration;

/// Connects SQS and SNS clients from the queue configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsConnector;

#[async_trait]
impl ServiceConnector for AwsConnector {
    async fn connect(&self, configuration: &QueueConfiguration) -> ServiceResult<Services> {
        let sdk_config = configuration.aws_config().await;

        info!(
            "Connecting SQS and SNS clients, region: {:?}, endpoint override: {:?}",
            sdk_config.region(),
            configuration.endpoint_url
        );

        let sqs_client = Arc::new(SqsClient::new(&sdk_config));
        let sns_client = Arc::new(SnsClient::new(&sdk_config));

        Ok(Services::new(
            Arc::new(SqsQueueService::new(sqs_client)),
            Arc::new(SnsNotificationService::new(sns_client)),
        ))
    }
}
