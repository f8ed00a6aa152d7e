//! End-to-end tests for the event pipeline: bus ordering, fan-out,
//! handler isolation, back-pressure, drain-on-close, and the façade's
//! statistics, run deterministically on the single-threaded test
//! runtime (the dispatch worker only progresses at await points).

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use uuid::Uuid;

use orders_core::clock::Clock;
use orders_core::event::{EventMetadata, EventType, OrderEvent};
use orders_core::order::{Order, OrderItem, OrderStatus};
use orders_events::bus::{EventBus, EventHandler, InMemoryEventBus, PublishError};
use orders_events::handlers::{AuditSink, NotificationSink};
use orders_events::service::{EventService, RequestContext};
use orders_events::stats::EventStats;
use orders_test_support::{
    FailingHandler, FixedClock, MemoryAuditSink, MemoryNotificationSink, RecordingHandler,
};

fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
    ))
}

fn metadata() -> EventMetadata {
    EventMetadata {
        request_id: Some("req-1".to_string()),
        user_agent: None,
        ip_address: None,
        source: "service_orders".to_string(),
        correlation_id: Some("req-1-order.create".to_string()),
    }
}

fn created_event() -> OrderEvent {
    let order = Order::new(Uuid::new_v4(), vec![], Utc::now());
    OrderEvent::order_created(&order, metadata(), Utc::now())
}

fn item(product: &str, quantity: u32, price: f64) -> OrderItem {
    OrderItem {
        product: product.to_string(),
        quantity,
        price,
    }
}

/// Everything a façade test needs to observe the pipeline.
struct Pipeline {
    service: EventService,
    stats: Arc<EventStats>,
    notifications: Arc<MemoryNotificationSink>,
    audit: Arc<MemoryAuditSink>,
}

fn pipeline() -> Pipeline {
    let stats = Arc::new(EventStats::new());
    let bus = Arc::new(InMemoryEventBus::new(Arc::clone(&stats)));
    let notifications = Arc::new(MemoryNotificationSink::new());
    let audit = Arc::new(MemoryAuditSink::new());
    let service = EventService::with_sinks(
        bus,
        Arc::clone(&stats),
        fixed_clock(),
        Arc::clone(&notifications) as Arc<dyn NotificationSink>,
        Arc::clone(&audit) as Arc<dyn AuditSink>,
    );
    Pipeline {
        service,
        stats,
        notifications,
        audit,
    }
}

// --- bus properties ---

#[tokio::test]
async fn test_events_dispatch_in_publish_order_per_producer() {
    let bus = InMemoryEventBus::new(Arc::new(EventStats::new()));
    let recorder = Arc::new(RecordingHandler::new("recorder"));
    bus.subscribe(EventType::OrderCreated, Arc::clone(&recorder) as Arc<dyn EventHandler>)
        .unwrap();

    let first = created_event();
    let second = created_event();
    bus.publish(first.clone()).unwrap();
    bus.publish(second.clone()).unwrap();
    bus.close().await.unwrap();

    assert_eq!(recorder.event_ids(), vec![first.id, second.id]);
}

#[tokio::test]
async fn test_fan_out_invokes_every_subscriber_once() {
    let bus = InMemoryEventBus::new(Arc::new(EventStats::new()));
    let recorders: Vec<Arc<RecordingHandler>> = vec![
        Arc::new(RecordingHandler::new("first")),
        Arc::new(RecordingHandler::new("second")),
        Arc::new(RecordingHandler::new("third")),
    ];
    for recorder in &recorders {
        bus.subscribe(EventType::OrderCreated, Arc::clone(recorder) as Arc<dyn EventHandler>)
            .unwrap();
    }

    let event = created_event();
    bus.publish(event.clone()).unwrap();
    bus.close().await.unwrap();

    for recorder in &recorders {
        let seen = recorder.events();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], event);
    }
}

#[tokio::test]
async fn test_failing_handler_does_not_affect_siblings() {
    let stats = Arc::new(EventStats::new());
    let bus = InMemoryEventBus::new(Arc::clone(&stats));
    let before = Arc::new(RecordingHandler::new("before"));
    let after = Arc::new(RecordingHandler::new("after"));
    bus.subscribe(EventType::OrderCreated, Arc::clone(&before) as Arc<dyn EventHandler>)
        .unwrap();
    bus.subscribe(EventType::OrderCreated, Arc::new(FailingHandler))
        .unwrap();
    bus.subscribe(EventType::OrderCreated, Arc::clone(&after) as Arc<dyn EventHandler>)
        .unwrap();

    bus.publish(created_event()).unwrap();
    bus.close().await.unwrap();

    assert_eq!(before.events().len(), 1);
    assert_eq!(after.events().len(), 1);
    assert_eq!(stats.snapshot().event_processing_errors, 1);
}

#[tokio::test]
async fn test_overflow_publishes_get_queue_full_not_a_block() {
    let bus = InMemoryEventBus::new(Arc::new(EventStats::new()));

    // The worker gets no chance to drain between these synchronous
    // publishes, so the 100-slot queue fills exactly.
    for _ in 0..100 {
        assert!(bus.publish(created_event()).is_ok());
    }
    assert_eq!(bus.publish(created_event()), Err(PublishError::QueueFull));
    assert_eq!(bus.publish(created_event()), Err(PublishError::QueueFull));

    bus.close().await.unwrap();
}

#[tokio::test]
async fn test_close_dispatches_everything_already_accepted() {
    let bus = InMemoryEventBus::new(Arc::new(EventStats::new()));
    let recorder = Arc::new(RecordingHandler::new("recorder"));
    bus.subscribe(EventType::OrderCreated, Arc::clone(&recorder) as Arc<dyn EventHandler>)
        .unwrap();

    let mut expected = Vec::new();
    for _ in 0..5 {
        let event = created_event();
        expected.push(event.id);
        bus.publish(event).unwrap();
    }
    bus.close().await.unwrap();

    assert_eq!(recorder.event_ids(), expected);
}

// --- façade statistics and scenarios ---

#[tokio::test]
async fn test_stats_count_one_created_event_exactly_once() {
    let p = pipeline();
    let order = Order::new(
        Uuid::new_v4(),
        vec![
            item("pen", 1, 50.0),
            item("notebook", 1, 50.0),
            item("bag", 1, 50.0),
        ],
        Utc::now(),
    );
    assert!((order.total_sum - 150.0).abs() < 1e-9);

    p.service
        .publish_order_created(&order, &RequestContext::empty())
        .unwrap();
    p.service.close().await.unwrap();

    let first = p.service.stats();
    let second = p.service.stats();
    assert_eq!(first, second);
    assert_eq!(first.orders_created, 1);
    assert_eq!(first.events_published, 1);
    assert_eq!(first.event_processing_errors, 0);
}

#[tokio::test]
async fn test_created_order_is_audited_but_not_notified() {
    let p = pipeline();
    let user = Uuid::new_v4();
    let order = Order::new(
        user,
        vec![item("widget", 1, 29.99), item("gadget", 1, 29.99)],
        Utc::now(),
    );
    assert!((order.total_sum - 59.98).abs() < 1e-9);

    p.service
        .publish_order_created(&order, &RequestContext::empty())
        .unwrap();
    p.service.close().await.unwrap();

    let records = p.audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["aggregate_id"], serde_json::json!(order.id));
    assert_eq!(records[0]["data"]["items"].as_array().unwrap().len(), 2);
    assert!(p.notifications.deliveries().is_empty());
}

#[tokio::test]
async fn test_cancellation_notifies_counts_and_audits() {
    let p = pipeline();
    let order_id = Uuid::new_v4();
    let owner = Uuid::new_v4();

    p.service
        .publish_order_status_updated(
            order_id,
            owner,
            owner,
            OrderStatus::Created,
            OrderStatus::Cancelled,
            &RequestContext::empty(),
        )
        .unwrap();
    p.service.close().await.unwrap();

    let snapshot = p.stats.snapshot();
    assert_eq!(snapshot.orders_cancelled, 1);
    assert_eq!(snapshot.status_updates, 1);

    let deliveries = p.notifications.deliveries();
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].0, owner);

    assert_eq!(p.audit.records().len(), 1);
}

#[tokio::test]
async fn test_transition_to_in_work_stays_quiet() {
    let p = pipeline();
    let owner = Uuid::new_v4();

    p.service
        .publish_order_status_updated(
            Uuid::new_v4(),
            owner,
            owner,
            OrderStatus::Created,
            OrderStatus::InWork,
            &RequestContext::empty(),
        )
        .unwrap();
    p.service.close().await.unwrap();

    let snapshot = p.stats.snapshot();
    assert_eq!(snapshot.orders_cancelled, 0);
    assert_eq!(snapshot.status_updates, 1);
    assert!(p.notifications.deliveries().is_empty());
}

#[tokio::test]
async fn test_cancel_convenience_is_a_cancellation_status_update() {
    let p = pipeline();
    let order_id = Uuid::new_v4();
    let owner = Uuid::new_v4();
    let admin = Uuid::new_v4();

    p.service
        .publish_order_cancelled(
            order_id,
            owner,
            admin,
            OrderStatus::InWork,
            &RequestContext::empty(),
        )
        .unwrap();
    p.service.close().await.unwrap();

    assert_eq!(p.stats.snapshot().orders_cancelled, 1);
    let records = p.audit.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["event_type"], "order.status.updated");
    assert_eq!(records[0]["data"]["new_status"], "отменён");
    assert_eq!(records[0]["data"]["updated_by"], serde_json::json!(admin));
}

#[tokio::test]
async fn test_custom_handler_receives_both_event_types() {
    let p = pipeline();
    let recorder = Arc::new(RecordingHandler::new("custom"));
    for event_type in EventType::ALL {
        p.service
            .add_custom_handler(event_type, Arc::clone(&recorder) as Arc<dyn EventHandler>)
            .unwrap();
    }

    let owner = Uuid::new_v4();
    let order = Order::new(owner, vec![], Utc::now());
    p.service
        .publish_order_created(&order, &RequestContext::empty())
        .unwrap();
    p.service
        .publish_order_status_updated(
            order.id,
            owner,
            owner,
            OrderStatus::Created,
            OrderStatus::Completed,
            &RequestContext::empty(),
        )
        .unwrap();
    p.service.close().await.unwrap();

    let seen = recorder.events();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].event_type(), EventType::OrderCreated);
    assert_eq!(seen[1].event_type(), EventType::OrderStatusUpdated);
}

#[tokio::test]
async fn test_publish_after_service_close_is_rejected() {
    let p = pipeline();
    p.service.close().await.unwrap();

    let order = Order::new(Uuid::new_v4(), vec![], Utc::now());
    let result = p
        .service
        .publish_order_created(&order, &RequestContext::empty());
    assert_eq!(result, Err(PublishError::Closed));
}
