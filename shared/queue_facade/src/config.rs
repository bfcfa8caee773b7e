use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_credential_types::Credentials;

use crate::audit::AuditSink;
use crate::error::{QueueError, QueueResult};
use crate::types::ReceiveRequest;

/// Default long-poll wait time, the SQS maximum
pub const DEFAULT_WAIT_TIME_SECONDS: i32 = 20;

/// Default number of messages fetched per receive call, the SQS maximum
pub const DEFAULT_MAX_MESSAGES: i32 = 10;

/// Configuration shared by every facade created from one queue context
#[derive(Clone)]
pub struct QueueConfiguration {
    /// AWS access key ID; the default credential chain is used unless both keys are set
    pub access_key_id: Option<String>,
    /// AWS secret access key
    pub secret_access_key: Option<String>,
    /// Environment tag appended to every queue name
    pub environment: Option<String>,
    /// AWS region override
    pub region: Option<String>,
    /// Endpoint override, e.g. `LocalStack`
    pub endpoint_url: Option<String>,
    /// How long the poll loop keeps going without receiving a message; polls forever when `None`
    pub idle_timeout: Option<Duration>,
    /// Long-poll wait time per receive call
    pub wait_time_seconds: i32,
    /// Maximum number of messages per receive call
    pub max_messages: i32,
    /// Visibility timeout for received messages, queue default when `None`
    pub visibility_timeout: Option<i32>,
    /// Log every received message and its body
    pub debug: bool,
    /// Audit sink recording send and receive activity
    pub audit_sink: Option<Arc<dyn AuditSink>>,
    /// Publish send failures to the failure notification topic
    pub sns_notifications: bool,
}

impl QueueConfiguration {
    /// Returns the environment tag
    ///
    /// # Errors
    ///
    /// Returns `QueueError::EnvironmentUndefined` if no non-blank environment is set
    pub fn environment(&self) -> QueueResult<&str> {
        self.environment
            .as_deref()
            .map(str::trim)
            .filter(|environment| !environment.is_empty())
            .ok_or(QueueError::EnvironmentUndefined)
    }

    /// Receive parameters for one call of the poll loop
    #[must_use]
    pub const fn receive_request(&self) -> ReceiveRequest {
        ReceiveRequest {
            max_messages: self.max_messages,
            wait_time_seconds: self.wait_time_seconds,
            visibility_timeout: self.visibility_timeout,
        }
    }

    /// AWS configuration with retry and timeout settings
    pub async fn aws_config(&self) -> aws_config::SdkConfig {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        // Must stay above the long-poll wait time
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(retry_config)
            .timeout_config(timeout_config);

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&self.access_key_id, &self.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::from_keys(
                access_key_id.clone(),
                secret_access_key.clone(),
                None,
            ));
        }

        if let Some(region) = &self.region {
            loader = loader.region(Region::new(region.clone()));
        }

        if let Some(endpoint_url) = &self.endpoint_url {
            loader = loader.endpoint_url(endpoint_url);
        }

        loader.load().await
    }
}

impl Default for QueueConfiguration {
    fn default() -> Self {
        Self {
            access_key_id: None,
            secret_access_key: None,
            environment: None,
            region: None,
            endpoint_url: None,
            idle_timeout: None,
            wait_time_seconds: DEFAULT_WAIT_TIME_SECONDS,
            max_messages: DEFAULT_MAX_MESSAGES,
            visibility_timeout: None,
            debug: false,
            audit_sink: None,
            sns_notifications: false,
        }
    }
}

impl fmt::Debug for QueueConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueConfiguration")
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .field("environment", &self.environment)
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .field("idle_timeout", &self.idle_timeout)
            .field("wait_time_seconds", &self.wait_time_seconds)
            .field("max_messages", &self.max_messages)
            .field("visibility_timeout", &self.visibility_timeout)
            .field("debug", &self.debug)
            .field("audit_sink", &self.audit_sink.is_some())
            .field("sns_notifications", &self.sns_notifications)
            .finish()
    }
}
