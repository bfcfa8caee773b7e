//! Test setup utilities: in-memory services, recording sinks and processors

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use queue_facade::{
    AuditEntry, AuditSink, MessageProcessor, NotificationService, PublishReceipt,
    QueueConfiguration, QueueContext, QueueHandle, QueueHost, QueueMessage, QueueService,
    ReceiveRequest, SendOptions, SendReceipt, ServiceError, ServiceResult, Services, TopicHandle,
};

/// Initialize tracing for tests
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init()
        .ok();
}

fn upstream_error(operation: &'static str, message: &str) -> ServiceError {
    ServiceError::Request {
        operation,
        message: message.to_string(),
        upstream: true,
    }
}

/// Message stored by the in-memory queue service
#[derive(Debug, Clone)]
pub struct StoredMessage {
    pub message: QueueMessage,
    pub options: SendOptions,
}

#[derive(Default)]
struct QueueStore {
    queues: HashMap<String, VecDeque<StoredMessage>>,
    in_flight: HashMap<String, StoredMessage>,
    deleted: Vec<String>,
    next_id: usize,
}

/// Queue service keeping queues in memory, with switchable failures
#[derive(Default)]
pub struct InMemoryQueueService {
    store: Mutex<QueueStore>,
    pub create_calls: AtomicUsize,
    pub receive_calls: AtomicUsize,
    pub fail_sends: AtomicBool,
    pub fail_creates: AtomicBool,
    pub fail_lookups: AtomicBool,
}

impl InMemoryQueueService {
    fn url(name: &str) -> String {
        format!("memory://queues/{name}")
    }

    /// Puts a message on a queue, creating the queue if needed
    pub fn seed(&self, queue_name: &str, body: &str) {
        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let id = store.next_id;
        store
            .queues
            .entry(queue_name.to_string())
            .or_default()
            .push_back(StoredMessage {
                message: QueueMessage {
                    message_id: format!("msg-{id}"),
                    receipt_handle: format!("receipt-{id}"),
                    body: body.to_string(),
                    attributes: BTreeMap::new(),
                },
                options: SendOptions::default(),
            });
    }

    /// Whether the queue exists
    pub fn has_queue(&self, queue_name: &str) -> bool {
        self.store.lock().unwrap().queues.contains_key(queue_name)
    }

    /// Messages waiting on the queue
    pub fn waiting(&self, queue_name: &str) -> Vec<StoredMessage> {
        self.store
            .lock()
            .unwrap()
            .queues
            .get(queue_name)
            .map(|queue| queue.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Message IDs received but not deleted
    pub fn in_flight(&self) -> Vec<String> {
        let store = self.store.lock().unwrap();
        let mut ids: Vec<_> = store
            .in_flight
            .values()
            .map(|stored| stored.message.message_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Receipt handles deleted so far, in order
    pub fn deleted(&self) -> Vec<String> {
        self.store.lock().unwrap().deleted.clone()
    }
}

#[async_trait]
impl QueueService for InMemoryQueueService {
    async fn create_queue(&self, name: &str) -> ServiceResult<QueueHandle> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(upstream_error("CreateQueue", "service unavailable"));
        }

        self.store
            .lock()
            .unwrap()
            .queues
            .entry(name.to_string())
            .or_default();

        Ok(QueueHandle {
            name: name.to_string(),
            url: Self::url(name),
        })
    }

    async fn get_queue(&self, name: &str) -> ServiceResult<QueueHandle> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(upstream_error("GetQueueUrl", "throttled"));
        }

        if !self.has_queue(name) {
            return Err(ServiceError::QueueNotFound(name.to_string()));
        }

        Ok(QueueHandle {
            name: name.to_string(),
            url: Self::url(name),
        })
    }

    async fn send_message(
        &self,
        queue: &QueueHandle,
        body: &str,
        options: &SendOptions,
    ) -> ServiceResult<SendReceipt> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(upstream_error("SendMessage", "connection refused"));
        }

        let mut store = self.store.lock().unwrap();
        store.next_id += 1;
        let id = store.next_id;
        let queue = store
            .queues
            .get_mut(&queue.name)
            .ok_or_else(|| ServiceError::QueueNotFound(queue.name.clone()))?;

        queue.push_back(StoredMessage {
            message: QueueMessage {
                message_id: format!("msg-{id}"),
                receipt_handle: format!("receipt-{id}"),
                body: body.to_string(),
                attributes: options.attributes.clone(),
            },
            options: options.clone(),
        });

        Ok(SendReceipt {
            message_id: format!("msg-{id}"),
            sequence_number: None,
        })
    }

    async fn receive_messages(
        &self,
        queue: &QueueHandle,
        request: &ReceiveRequest,
    ) -> ServiceResult<Vec<QueueMessage>> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);

        let mut store = self.store.lock().unwrap();
        let waiting = store
            .queues
            .get_mut(&queue.name)
            .ok_or_else(|| ServiceError::QueueNotFound(queue.name.clone()))?;

        let take = usize::try_from(request.max_messages).unwrap().min(waiting.len());
        let batch: Vec<_> = waiting.drain(..take).collect();

        let messages = batch.iter().map(|stored| stored.message.clone()).collect();
        for stored in batch {
            store
                .in_flight
                .insert(stored.message.receipt_handle.clone(), stored);
        }

        Ok(messages)
    }

    async fn delete_message(
        &self,
        _queue: &QueueHandle,
        receipt_handle: &str,
    ) -> ServiceResult<()> {
        let mut store = self.store.lock().unwrap();
        store.in_flight.remove(receipt_handle);
        store.deleted.push(receipt_handle.to_string());
        Ok(())
    }

    async fn approximate_message_count(&self, queue: &QueueHandle) -> ServiceResult<u64> {
        Ok(self.waiting(&queue.name).len() as u64)
    }

    async fn delete_queue(&self, queue: &QueueHandle) -> ServiceResult<()> {
        self.store
            .lock()
            .unwrap()
            .queues
            .remove(&queue.name)
            .map(|_| ())
            .ok_or_else(|| ServiceError::QueueNotFound(queue.name.clone()))
    }
}

/// A published alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub topic: String,
    pub message: String,
    pub subject: String,
}

/// Notification service that records topic creation and publishes
#[derive(Default)]
pub struct RecordingNotificationService {
    pub created_topics: Mutex<Vec<String>>,
    pub published: Mutex<Vec<Published>>,
    pub fail_publishes: AtomicBool,
}

impl RecordingNotificationService {
    pub fn created_topics(&self) -> Vec<String> {
        self.created_topics.lock().unwrap().clone()
    }

    pub fn published(&self) -> Vec<Published> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationService for RecordingNotificationService {
    async fn create_topic(&self, name: &str) -> ServiceResult<TopicHandle> {
        self.created_topics.lock().unwrap().push(name.to_string());
        Ok(TopicHandle {
            name: name.to_string(),
            arn: format!("arn:aws:sns:us-east-1:000000000000:{name}"),
        })
    }

    async fn publish(
        &self,
        topic: &TopicHandle,
        message: &str,
        subject: &str,
    ) -> ServiceResult<PublishReceipt> {
        if self.fail_publishes.load(Ordering::SeqCst) {
            return Err(upstream_error("Publish", "topic unavailable"));
        }

        let mut published = self.published.lock().unwrap();
        published.push(Published {
            topic: topic.name.clone(),
            message: message.to_string(),
            subject: subject.to_string(),
        });

        Ok(PublishReceipt {
            message_id: format!("alert-{}", published.len()),
        })
    }
}

/// Audit sink collecting entries in memory
#[derive(Default)]
pub struct RecordingAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl RecordingAuditSink {
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AuditSink for RecordingAuditSink {
    async fn record(&self, entry: AuditEntry) -> anyhow::Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }
}

/// Host that records processed message bodies and fails on a chosen body
#[derive(Default)]
pub struct OrderEvents {
    pub processed: Mutex<Vec<String>>,
    pub fail_on: Option<String>,
}

impl OrderEvents {
    pub fn failing_on(body: &str) -> Self {
        Self {
            processed: Mutex::default(),
            fail_on: Some(body.to_string()),
        }
    }

    pub fn processed(&self) -> Vec<String> {
        self.processed.lock().unwrap().clone()
    }
}

impl QueueHost for OrderEvents {}

#[async_trait]
impl MessageProcessor for OrderEvents {
    async fn process_message(&self, message: &QueueMessage) -> anyhow::Result<()> {
        if self.fail_on.as_deref() == Some(message.body.as_str()) {
            anyhow::bail!("cannot handle {}", message.body);
        }

        self.processed.lock().unwrap().push(message.body.clone());
        Ok(())
    }
}

/// Producer-only host with an explicit queue name
pub struct BillingExports;

impl QueueHost for BillingExports {
    const QUEUE_NAME: Option<&'static str> = Some("billing_exports");
}

/// In-memory services wired into a queue context
pub struct TestContext {
    pub queues: Arc<InMemoryQueueService>,
    pub notifications: Arc<RecordingNotificationService>,
    pub audit: Arc<RecordingAuditSink>,
    pub context: Arc<QueueContext>,
}

impl TestContext {
    /// Creates a context that has not been configured
    pub fn unconfigured() -> Self {
        init_tracing();

        let queues = Arc::new(InMemoryQueueService::default());
        let notifications = Arc::new(RecordingNotificationService::default());
        let services = Services::new(queues.clone(), notifications.clone());

        Self {
            queues,
            notifications,
            audit: Arc::new(RecordingAuditSink::default()),
            context: Arc::new(QueueContext::new(services)),
        }
    }

    /// Creates a context configured for the `test` environment with the
    /// audit sink attached and an idle timeout that ends polling on the first
    /// empty receive
    pub async fn new() -> Self {
        Self::with(|_| {}).await
    }

    /// Like [`Self::new`], with extra configuration applied afterwards
    pub async fn with<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut QueueConfiguration),
    {
        let ctx = Self::unconfigured();
        let audit = ctx.audit.clone();

        ctx.context
            .configure(|config| {
                config.environment = Some("test".to_string());
                config.idle_timeout = Some(Duration::ZERO);
                config.wait_time_seconds = 0;
                config.audit_sink = Some(audit);
                mutator(config);
            })
            .await
            .expect("Failed to configure queue context");

        ctx
    }
}
