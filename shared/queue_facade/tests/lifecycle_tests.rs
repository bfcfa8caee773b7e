//! Integration tests for queue naming, handle binding and ancillary operations

mod common;

use std::sync::atomic::Ordering;

use crate::common::{BillingExports, OrderEvents, TestContext};
use pretty_assertions::assert_eq;
use queue_facade::{naming, QueueError, QueueFacade, QueueState};

#[tokio::test]
async fn test_queue_name_derived_from_host_type() {
    let ctx = TestContext::new().await;
    let queue = QueueFacade::new(ctx.context.clone(), OrderEvents::default());

    let expected = format!("{}_test", naming::type_base_name::<OrderEvents>());
    assert_eq!(queue.queue_name().unwrap(), expected);
    assert!(expected.ends_with("common_order_events_test"));

    // Stable across calls and later reconfiguration
    ctx.context
        .configure(|config| config.environment = Some("production".to_string()))
        .await
        .unwrap();
    assert_eq!(queue.queue_name().unwrap(), expected);
}

#[tokio::test]
async fn test_queue_name_overrides() {
    let ctx = TestContext::new().await;

    let exports = QueueFacade::new(ctx.context.clone(), BillingExports);
    assert_eq!(exports.queue_name().unwrap(), "billing_exports_test");

    let renamed =
        QueueFacade::with_base_name(ctx.context.clone(), OrderEvents::default(), "orders");
    assert_eq!(renamed.base_name(), "orders");
    assert_eq!(renamed.queue_name().unwrap(), "orders_test");
}

#[tokio::test]
async fn test_queue_binds_once() {
    let ctx = TestContext::new().await;
    let queue = QueueFacade::new(ctx.context.clone(), BillingExports);

    assert_eq!(queue.state().await, QueueState::Unbound);

    let (first, second) = tokio::join!(queue.queue(), queue.queue());
    let first = first.unwrap();
    assert_eq!(first, second.unwrap());
    assert_eq!(first.name, "billing_exports_test");
    assert_eq!(queue.state().await, QueueState::Bound);

    queue.queue().await.unwrap();
    assert_eq!(ctx.queues.create_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_create_stays_unbound() {
    let ctx = TestContext::new().await;
    ctx.queues.fail_creates.store(true, Ordering::SeqCst);
    let queue = QueueFacade::new(ctx.context.clone(), BillingExports);

    let err = queue.queue().await.unwrap_err();
    assert!(matches!(err, QueueError::Service(_)));
    assert!(err.is_upstream_error());
    assert_eq!(queue.state().await, QueueState::Unbound);

    ctx.queues.fail_creates.store(false, Ordering::SeqCst);
    queue.queue().await.unwrap();
    assert_eq!(queue.state().await, QueueState::Bound);
}

#[tokio::test]
async fn test_count_reports_waiting_messages() {
    let ctx = TestContext::new().await;
    let queue = QueueFacade::new(ctx.context.clone(), BillingExports);

    assert_eq!(queue.count().await.unwrap(), 0);

    ctx.queues.seed("billing_exports_test", "one");
    ctx.queues.seed("billing_exports_test", "two");
    assert_eq!(queue.count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_exists_and_lookup() {
    let ctx = TestContext::new().await;
    let queue = QueueFacade::new(ctx.context.clone(), BillingExports);

    assert!(!queue.exists().await.unwrap());
    assert!(!queue.lookup_queue().await.unwrap());
    // Looking up never creates the queue
    assert!(!ctx.queues.has_queue("billing_exports_test"));

    queue.queue().await.unwrap();
    assert!(queue.exists().await.unwrap());
    assert!(queue.lookup_queue().await.unwrap());
}

#[tokio::test]
async fn test_exists_treats_lookup_failure_as_missing() {
    let ctx = TestContext::new().await;
    let queue = QueueFacade::new(ctx.context.clone(), BillingExports);
    queue.queue().await.unwrap();

    ctx.queues.fail_lookups.store(true, Ordering::SeqCst);

    assert!(!queue.exists().await.unwrap());
    let err = queue.lookup_queue().await.unwrap_err();
    assert!(err.is_upstream_error());
}

#[tokio::test]
async fn test_delete_queue_unbinds() {
    let ctx = TestContext::new().await;
    let queue = QueueFacade::new(ctx.context.clone(), BillingExports);

    queue.queue().await.unwrap();
    queue.delete_queue().await.unwrap();

    assert_eq!(queue.state().await, QueueState::Unbound);
    assert!(!ctx.queues.has_queue("billing_exports_test"));
    assert!(!queue.exists().await.unwrap());

    // The next operation recreates the queue
    assert_eq!(queue.count().await.unwrap(), 0);
    assert!(ctx.queues.has_queue("billing_exports_test"));
    assert_eq!(ctx.queues.create_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_delete_propagates_service_errors() {
    let ctx = TestContext::new().await;
    ctx.queues.fail_creates.store(true, Ordering::SeqCst);
    let queue = QueueFacade::new(ctx.context.clone(), BillingExports);

    let err = queue.delete_queue().await.unwrap_err();
    assert!(matches!(err, QueueError::Service(_)));
    assert_eq!(queue.state().await, QueueState::Unbound);
}
