//! SQS queue service
//!
//! Thin mapping from [`QueueService`] calls onto the SQS client.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use aws_sdk_sqs::types::{MessageAttributeValue, QueueAttributeName};
use aws_sdk_sqs::Client as SqsClient;

use super::{QueueService, ServiceError, ServiceResult};
use crate::types::{QueueHandle, QueueMessage, ReceiveRequest, SendOptions, SendReceipt};

/// Queue service backed by AWS SQS
pub struct SqsQueueService {
    sqs_client: Arc<SqsClient>,
}

impl SqsQueueService {
    /// Creates a new SQS queue service
    ///
    /// # Arguments
    ///
    /// * `sqs_client` - Pre-configured SQS client
    #[must_use]
    pub const fn new(sqs_client: Arc<SqsClient>) -> Self {
        Self { sqs_client }
    }

    fn message_attributes(
        options: &SendOptions,
    ) -> ServiceResult<Option<HashMap<String, MessageAttributeValue>>> {
        if options.attributes.is_empty() {
            return Ok(None);
        }

        options
            .attributes
            .iter()
            .map(|(key, value)| {
                MessageAttributeValue::builder()
                    .data_type("String")
                    .string_value(value)
                    .build()
                    .map(|attribute| (key.clone(), attribute))
                    .map_err(|e| ServiceError::InvalidRequest(format!("attribute {key}: {e}")))
            })
            .collect::<ServiceResult<HashMap<_, _>>>()
            .map(Some)
    }
}

#[async_trait]
impl QueueService for SqsQueueService {
    async fn create_queue(&self, name: &str) -> ServiceResult<QueueHandle> {
        // CreateQueue returns the existing queue URL when attributes match
        let result = self
            .sqs_client
            .create_queue()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| ServiceError::request("CreateQueue", &e))?;

        let url = result
            .queue_url()
            .ok_or(ServiceError::MalformedResponse {
                operation: "CreateQueue",
                field: "QueueUrl",
            })?
            .to_string();

        Ok(QueueHandle {
            name: name.to_string(),
            url,
        })
    }

    async fn get_queue(&self, name: &str) -> ServiceResult<QueueHandle> {
        let result = self
            .sqs_client
            .get_queue_url()
            .queue_name(name)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error()
                    .is_some_and(GetQueueUrlError::is_queue_does_not_exist)
                {
                    ServiceError::QueueNotFound(name.to_string())
                } else {
                    ServiceError::request("GetQueueUrl", &e)
                }
            })?;

        let url = result
            .queue_url()
            .ok_or(ServiceError::MalformedResponse {
                operation: "GetQueueUrl",
                field: "QueueUrl",
            })?
            .to_string();

        Ok(QueueHandle {
            name: name.to_string(),
            url,
        })
    }

    async fn send_message(
        &self,
        queue: &QueueHandle,
        body: &str,
        options: &SendOptions,
    ) -> ServiceResult<SendReceipt> {
        let result = self
            .sqs_client
            .send_message()
            .queue_url(&queue.url)
            .message_body(body)
            .set_delay_seconds(options.delay_seconds)
            .set_message_group_id(options.message_group_id.clone())
            .set_message_deduplication_id(options.message_deduplication_id.clone())
            .set_message_attributes(Self::message_attributes(options)?)
            .send()
            .await
            .map_err(|e| ServiceError::request("SendMessage", &e))?;

        Ok(SendReceipt {
            message_id: result
                .message_id()
                .map(std::string::ToString::to_string)
                .unwrap_or_default(),
            sequence_number: result.sequence_number().map(ToString::to_string),
        })
    }

    async fn receive_messages(
        &self,
        queue: &QueueHandle,
        request: &ReceiveRequest,
    ) -> ServiceResult<Vec<QueueMessage>> {
        let result = self
            .sqs_client
            .receive_message()
            .queue_url(&queue.url)
            .max_number_of_messages(request.max_messages)
            .wait_time_seconds(request.wait_time_seconds)
            .set_visibility_timeout(request.visibility_timeout)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|e| ServiceError::request("ReceiveMessage", &e))?;

        let messages = result
            .messages()
            .iter()
            .filter_map(|msg| {
                let Some(receipt_handle) = msg.receipt_handle() else {
                    tracing::error!(
                        "Dropping message {:?} from {} without receipt handle",
                        msg.message_id(),
                        queue.name
                    );
                    return None;
                };

                let attributes = msg
                    .message_attributes()
                    .map(|attributes| {
                        attributes
                            .iter()
                            .filter_map(|(key, value)| {
                                value
                                    .string_value()
                                    .map(|v| (key.clone(), v.to_string()))
                            })
                            .collect::<BTreeMap<_, _>>()
                    })
                    .unwrap_or_default();

                Some(QueueMessage {
                    message_id: msg.message_id().unwrap_or_default().to_string(),
                    receipt_handle: receipt_handle.to_string(),
                    body: msg.body().unwrap_or_default().to_string(),
                    attributes,
                })
            })
            .collect();

        Ok(messages)
    }

    async fn delete_message(
        &self,
        queue: &QueueHandle,
        receipt_handle: &str,
    ) -> ServiceResult<()> {
        self.sqs_client
            .delete_message()
            .queue_url(&queue.url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| ServiceError::request("DeleteMessage", &e))?;

        Ok(())
    }

    async fn approximate_message_count(&self, queue: &QueueHandle) -> ServiceResult<u64> {
        let result = self
            .sqs_client
            .get_queue_attributes()
            .queue_url(&queue.url)
            .attribute_names(QueueAttributeName::ApproximateNumberOfMessages)
            .send()
            .await
            .map_err(|e| ServiceError::request("GetQueueAttributes", &e))?;

        let missing = || ServiceError::MalformedResponse {
            operation: "GetQueueAttributes",
            field: "ApproximateNumberOfMessages",
        };

        result
            .attributes()
            .and_then(|attributes| attributes.get(&QueueAttributeName::ApproximateNumberOfMessages))
            .ok_or_else(missing)?
            .parse()
            .map_err(|_| missing())
    }

    async fn delete_queue(&self, queue: &QueueHandle) -> ServiceResult<()> {
        self.sqs_client
            .delete_queue()
            .queue_url(&queue.url)
            .send()
            .await
            .map_err(|e| ServiceError::request("DeleteQueue", &e))?;

        Ok(())
    }
}
