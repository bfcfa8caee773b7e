//! Audit trail of send and receive activity
//!
//! The facade records one [`AuditEntry`] per send attempt and one per
//! received message when an [`AuditSink`] is configured. Persistence is up to
//! the host application; [`TracingAuditSink`] writes entries to the tracing
//! pipeline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use strum::{Display, EnumString};

/// Queue activity recorded in the audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum AuditAction {
    /// A send attempt
    Send,
    /// A received message
    Receive,
}

/// One audit record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    /// Queue the activity happened on
    pub queue_name: String,
    /// Kind of activity
    pub action: AuditAction,
    /// Message body
    pub message: String,
    /// Error description of a failed send
    pub error: Option<String>,
    /// When the entry was created
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry for a send attempt
    #[must_use]
    pub fn send(queue_name: &str, message: &str, error: Option<String>) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            action: AuditAction::Send,
            message: message.to_string(),
            error,
            recorded_at: Utc::now(),
        }
    }

    /// Creates an entry for a received message
    #[must_use]
    pub fn receive(queue_name: &str, message: &str) -> Self {
        Self {
            queue_name: queue_name.to_string(),
            action: AuditAction::Receive,
            message: message.to_string(),
            error: None,
            recorded_at: Utc::now(),
        }
    }
}

/// Host-supplied persistence for audit entries
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Persists one audit entry
    ///
    /// # Errors
    ///
    /// Failures are logged by the facade and never fail the queue operation.
    async fn record(&self, entry: AuditEntry) -> anyhow::Result<()>;
}

/// Audit sink that writes entries as tracing events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        tracing::info!(
            target: "queue_facade::audit",
            queue_name = %entry.queue_name,
            action = %entry.action,
            error = entry.error.as_deref().unwrap_or_default(),
            recorded_at = %entry.recorded_at.to_rfc3339(),
            "{}",
            entry.message
        );
        Ok(())
    }
}
