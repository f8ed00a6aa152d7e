//! Built-in event subscribers.
//!
//! Four roles coexist on every event type: a default logging handler,
//! analytics counting, user notifications, and audit emission. Handlers
//! share no mutable state except the injected atomic counters, and each
//! runs in its own spawned task.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use orders_core::event::{OrderEvent, OrderEventKind};
use orders_core::order::OrderStatus;

use crate::bus::{EventHandler, HandlerError};
use crate::stats::EventStats;

/// Default handler: writes one structured log line per event.
#[derive(Debug, Clone, Copy)]
pub struct LoggingHandler;

#[async_trait]
impl EventHandler for LoggingHandler {
    fn name(&self) -> &'static str {
        "logging"
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), HandlerError> {
        match &event.kind {
            OrderEventKind::Created(data) => {
                tracing::info!(
                    order_id = %data.order_id,
                    user_id = %data.user_id,
                    total_sum = data.total_sum,
                    items = data.items.len(),
                    "order created"
                );
            }
            OrderEventKind::StatusUpdated(data) => {
                tracing::info!(
                    order_id = %data.order_id,
                    user_id = %data.user_id,
                    old_status = %data.old_status,
                    new_status = %data.new_status,
                    "order status updated"
                );
            }
        }
        Ok(())
    }
}

/// Analytics handler: maintains the pipeline counters.
pub struct AnalyticsHandler {
    stats: Arc<EventStats>,
}

impl AnalyticsHandler {
    /// Creates the handler around the shared counter set.
    #[must_use]
    pub fn new(stats: Arc<EventStats>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl EventHandler for AnalyticsHandler {
    fn name(&self) -> &'static str {
        "analytics"
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), HandlerError> {
        self.stats.record_published();
        match &event.kind {
            OrderEventKind::Created(data) => {
                self.stats.record_order_created();
                tracing::info!(
                    target: "analytics",
                    order_id = %data.order_id,
                    total_sum = data.total_sum,
                    items = data.items.len(),
                    "new order"
                );
            }
            OrderEventKind::StatusUpdated(data) => {
                self.stats.record_status_update();
                if data.new_status == OrderStatus::Cancelled {
                    self.stats.record_cancellation();
                }
                tracing::info!(
                    target: "analytics",
                    order_id = %data.order_id,
                    old_status = %data.old_status,
                    new_status = %data.new_status,
                    "order status changed"
                );
            }
        }
        Ok(())
    }
}

/// Destination for user-facing notifications. Email, push, or SMS
/// transports all live behind this seam.
pub trait NotificationSink: Send + Sync {
    /// Delivers one notification to a user.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Notification`] when delivery fails.
    fn deliver(&self, user_id: Uuid, message: &str) -> Result<(), HandlerError>;
}

/// Default sink that emits notifications as log lines.
#[derive(Debug, Clone, Copy)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    fn deliver(&self, user_id: Uuid, message: &str) -> Result<(), HandlerError> {
        tracing::info!(target: "notifications", %user_id, message, "notification sent");
        Ok(())
    }
}

/// Notification handler: notifies users about terminal status changes.
pub struct NotificationHandler {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationHandler {
    /// Creates the handler around a delivery sink.
    #[must_use]
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Whether a transition into `status` warrants a notification.
    /// Intermediate states stay quiet; only fulfilment and cancellation
    /// reach the user.
    #[must_use]
    pub fn should_notify(status: OrderStatus) -> bool {
        matches!(status, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

#[async_trait]
impl EventHandler for NotificationHandler {
    fn name(&self) -> &'static str {
        "notifications"
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), HandlerError> {
        match &event.kind {
            OrderEventKind::Created(data) => {
                tracing::debug!(
                    target: "notifications",
                    order_id = %data.order_id,
                    "order creation requires no notification"
                );
                Ok(())
            }
            OrderEventKind::StatusUpdated(data) => {
                if Self::should_notify(data.new_status) {
                    let message = format!(
                        "order {} status changed to '{}'",
                        data.order_id, data.new_status
                    );
                    self.sink.deliver(data.user_id, &message)
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// Destination for audit records. Durability is the sink's concern: a
/// log line, a file append, or an audit-table insert all satisfy it.
pub trait AuditSink: Send + Sync {
    /// Appends one audit record.
    ///
    /// # Errors
    ///
    /// Returns [`HandlerError::Audit`] when the record cannot be stored.
    fn append(&self, record: &serde_json::Value) -> Result<(), HandlerError>;
}

/// Default sink that emits audit records as log lines.
#[derive(Debug, Clone, Copy)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn append(&self, record: &serde_json::Value) -> Result<(), HandlerError> {
        tracing::info!(target: "audit", %record, "audit event");
        Ok(())
    }
}

/// Audit handler: serializes the full event into a structured record.
pub struct AuditHandler {
    sink: Arc<dyn AuditSink>,
}

impl AuditHandler {
    /// Creates the handler around an audit sink.
    #[must_use]
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// The audit record for one event.
    #[must_use]
    pub fn record(event: &OrderEvent) -> serde_json::Value {
        serde_json::json!({
            "event_id": event.id,
            "event_type": event.event_type(),
            "aggregate_id": event.aggregate_id,
            "user_id": event.user_id,
            "timestamp": event.timestamp,
            "metadata": event.metadata,
            "data": event.kind.to_payload(),
        })
    }
}

#[async_trait]
impl EventHandler for AuditHandler {
    fn name(&self) -> &'static str {
        "audit"
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), HandlerError> {
        self.sink.append(&Self::record(event))
    }
}
