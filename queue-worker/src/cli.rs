//! Command line interface of the queue worker

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use queue_facade::config::DEFAULT_WAIT_TIME_SECONDS;
use queue_facade::{QueueConfiguration, SendOptions, TracingAuditSink};

use crate::types::Environment;

/// Sends to, drains and inspects one environment-scoped queue
#[derive(Debug, Parser)]
#[command(name = "queue-worker", version)]
pub struct Cli {
    /// Queue base name; derived from the processor type when omitted
    #[arg(long, env = "QUEUE_NAME")]
    pub queue_name: Option<String>,

    /// AWS access key id, used together with the secret access key
    #[arg(long, env = "AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub access_key_id: Option<String>,

    /// AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub secret_access_key: Option<String>,

    /// AWS region
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Log every received message body
    #[arg(long, env = "QUEUE_DEBUG")]
    pub debug: bool,

    /// Publish an alert when a send fails
    #[arg(long, env = "QUEUE_SNS_NOTIFICATIONS")]
    pub sns_notifications: bool,

    /// Write audit records to the log
    #[arg(long, env = "QUEUE_AUDIT")]
    pub audit: bool,

    /// Stop receiving after this many seconds without a message
    #[arg(long, env = "QUEUE_IDLE_TIMEOUT_SECS")]
    pub idle_timeout_secs: Option<u64>,

    /// Long polling wait per receive call
    #[arg(
        long,
        env = "QUEUE_WAIT_TIME_SECONDS",
        default_value_t = DEFAULT_WAIT_TIME_SECONDS
    )]
    pub wait_time_seconds: i32,

    #[command(subcommand)]
    pub command: Command,
}

/// Operation to run against the queue
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Send one message
    Send {
        /// Message body
        message: String,
        /// Delivery delay
        #[arg(long)]
        delay_seconds: Option<i32>,
        /// Message group id, required by FIFO queues
        #[arg(long)]
        group_id: Option<String>,
    },
    /// Receive and log messages until idle or interrupted
    Receive,
    /// Print the approximate number of waiting messages
    Count,
    /// Print whether the queue exists
    Exists,
    /// Delete the queue
    DeleteQueue,
}

impl Command {
    /// Delivery options of a `send` command
    #[must_use]
    pub fn send_options(&self) -> SendOptions {
        match self {
            Self::Send {
                delay_seconds,
                group_id,
                ..
            } => SendOptions {
                delay_seconds: *delay_seconds,
                message_group_id: group_id.clone(),
                ..SendOptions::default()
            },
            _ => SendOptions::default(),
        }
    }
}

impl Cli {
    /// Applies the command line settings to the facade configuration
    pub fn apply(&self, config: &mut QueueConfiguration, environment: Environment) {
        config.environment = Some(environment.queue_tag());
        config.access_key_id.clone_from(&self.access_key_id);
        config.secret_access_key.clone_from(&self.secret_access_key);
        config.region = self
            .region
            .clone()
            .or_else(|| environment.default_region().map(str::to_string));
        config.endpoint_url = environment
            .override_aws_endpoint_url()
            .map(str::to_string);
        config.idle_timeout = self.idle_timeout_secs.map(Duration::from_secs);
        config.wait_time_seconds = self.wait_time_seconds;
        config.debug = self.debug;
        config.sns_notifications = self.sns_notifications;
        if self.audit {
            config.audit_sink = Some(Arc::new(TracingAuditSink));
        }
    }
}
