//! Event service façade.
//!
//! Translates committed order mutations plus ambient HTTP-request context
//! into events, publishes them through the bus, and exposes the running
//! counters for the monitoring endpoint. Event delivery is best-effort
//! and side-channel: callers log publish failures and never roll back the
//! already-committed database change.

use std::sync::Arc;

use uuid::Uuid;

use orders_core::clock::Clock;
use orders_core::event::{EventMetadata, EventType, OrderEvent};
use orders_core::order::{Order, OrderStatus};

use crate::bus::{CloseError, EventBus, EventHandler, PublishError, SubscribeError};
use crate::handlers::{
    AnalyticsHandler, AuditHandler, AuditSink, LogAuditSink, LogNotificationSink, LoggingHandler,
    NotificationHandler, NotificationSink,
};
use crate::stats::{EventStats, StatsSnapshot};

/// Name this service stamps into event metadata as the source.
pub const SERVICE_NAME: &str = "service_orders";

const OP_ORDER_CREATE: &str = "order.create";
const OP_ORDER_STATUS_UPDATE: &str = "order.status.update";

/// Ambient request context carried into event metadata.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Request id forwarded by the gateway.
    pub request_id: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Peer address of the request.
    pub remote_addr: Option<String>,
}

impl RequestContext {
    /// Context for publications with no originating HTTP request.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Façade over the event bus for the order handlers.
pub struct EventService {
    bus: Arc<dyn EventBus>,
    stats: Arc<EventStats>,
    clock: Arc<dyn Clock>,
}

impl EventService {
    /// Creates the service and registers the initial handler set with
    /// log-based notification and audit sinks.
    #[must_use]
    pub fn new(bus: Arc<dyn EventBus>, stats: Arc<EventStats>, clock: Arc<dyn Clock>) -> Self {
        Self::with_sinks(
            bus,
            stats,
            clock,
            Arc::new(LogNotificationSink),
            Arc::new(LogAuditSink),
        )
    }

    /// Creates the service with explicit notification and audit sinks.
    ///
    /// Registers, for every known event type: the default logging
    /// handler, analytics, notifications, and audit.
    #[must_use]
    pub fn with_sinks(
        bus: Arc<dyn EventBus>,
        stats: Arc<EventStats>,
        clock: Arc<dyn Clock>,
        notifications: Arc<dyn NotificationSink>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let service = Self { bus, stats, clock };

        let initial: [Arc<dyn EventHandler>; 4] = [
            Arc::new(LoggingHandler),
            Arc::new(AnalyticsHandler::new(Arc::clone(&service.stats))),
            Arc::new(NotificationHandler::new(notifications)),
            Arc::new(AuditHandler::new(audit)),
        ];
        for handler in initial {
            for event_type in EventType::ALL {
                if let Err(err) = service.bus.subscribe(event_type, Arc::clone(&handler)) {
                    tracing::error!(
                        handler = handler.name(),
                        event_type = %event_type,
                        error = %err,
                        "failed to register event handler"
                    );
                }
            }
        }
        tracing::info!("event handlers registered: logging, analytics, notifications, audit");

        service
    }

    /// Publishes an `order.created` event for a just-persisted order.
    ///
    /// # Errors
    ///
    /// Returns the bus's [`PublishError`]; the caller should log it and
    /// continue, since the order itself is already committed.
    pub fn publish_order_created(
        &self,
        order: &Order,
        ctx: &RequestContext,
    ) -> Result<(), PublishError> {
        let metadata = self.metadata(ctx, OP_ORDER_CREATE);
        let event = OrderEvent::order_created(order, metadata, self.clock.now());
        self.publish(event)
    }

    /// Publishes an `order.status.updated` event for a committed
    /// transition. `updated_by` may differ from the owner.
    ///
    /// # Errors
    ///
    /// Returns the bus's [`PublishError`]; log-and-continue applies.
    pub fn publish_order_status_updated(
        &self,
        order_id: Uuid,
        owner_id: Uuid,
        updated_by: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
        ctx: &RequestContext,
    ) -> Result<(), PublishError> {
        let metadata = self.metadata(ctx, OP_ORDER_STATUS_UPDATE);
        let event = OrderEvent::order_status_updated(
            order_id,
            owner_id,
            updated_by,
            old_status,
            new_status,
            metadata,
            self.clock.now(),
        );
        self.publish(event)
    }

    /// Publishes an order cancellation: a status update into the terminal
    /// cancelled state.
    ///
    /// # Errors
    ///
    /// Returns the bus's [`PublishError`]; log-and-continue applies.
    pub fn publish_order_cancelled(
        &self,
        order_id: Uuid,
        owner_id: Uuid,
        cancelled_by: Uuid,
        old_status: OrderStatus,
        ctx: &RequestContext,
    ) -> Result<(), PublishError> {
        self.publish_order_status_updated(
            order_id,
            owner_id,
            cancelled_by,
            old_status,
            OrderStatus::Cancelled,
            ctx,
        )
    }

    /// Registers an additional handler with the same contract as the
    /// bus's subscribe.
    ///
    /// # Errors
    ///
    /// Returns [`SubscribeError`] when the underlying bus rejects the
    /// registration.
    pub fn add_custom_handler(
        &self,
        event_type: EventType,
        handler: Arc<dyn EventHandler>,
    ) -> Result<(), SubscribeError> {
        self.bus.subscribe(event_type, handler)
    }

    /// Point-in-time counters for the monitoring endpoint.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Closes the underlying bus: drains buffered events and waits for
    /// in-flight handlers. Part of the hosting process's graceful
    /// shutdown sequence.
    ///
    /// # Errors
    ///
    /// Returns [`CloseError`] when the bus cannot shut down cleanly.
    pub async fn close(&self) -> Result<(), CloseError> {
        self.bus.close().await
    }

    fn publish(&self, event: OrderEvent) -> Result<(), PublishError> {
        let event_type = event.event_type();
        let event_id = event.id;
        let aggregate_id = event.aggregate_id;
        self.bus.publish(event)?;
        tracing::debug!(
            event_type = %event_type,
            event_id = %event_id,
            aggregate_id = %aggregate_id,
            "event published"
        );
        Ok(())
    }

    fn metadata(&self, ctx: &RequestContext, operation: &str) -> EventMetadata {
        let correlation_id = match &ctx.request_id {
            Some(request_id) => format!("{request_id}-{operation}"),
            None => operation.to_string(),
        };
        EventMetadata {
            request_id: ctx.request_id.clone(),
            user_agent: ctx.user_agent.clone(),
            ip_address: ctx.remote_addr.clone(),
            source: SERVICE_NAME.to_string(),
            correlation_id: Some(correlation_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use orders_core::clock::SystemClock;

    use crate::broker::BrokerEventBus;

    use super::*;

    fn service_over_stub() -> EventService {
        // The broker stub rejects registrations; construction must still
        // succeed (failures are logged, not escalated).
        EventService::new(
            Arc::new(BrokerEventBus::new(vec![], "orders.events")),
            Arc::new(EventStats::new()),
            Arc::new(SystemClock),
        )
    }

    #[test]
    fn test_correlation_id_concatenates_request_id_and_operation() {
        let service = service_over_stub();
        let ctx = RequestContext {
            request_id: Some("req-42".to_string()),
            user_agent: Some("curl/8".to_string()),
            remote_addr: Some("127.0.0.1:5000".to_string()),
        };

        let metadata = service.metadata(&ctx, OP_ORDER_CREATE);
        assert_eq!(
            metadata.correlation_id.as_deref(),
            Some("req-42-order.create")
        );
        assert_eq!(metadata.source, SERVICE_NAME);
        assert_eq!(metadata.ip_address.as_deref(), Some("127.0.0.1:5000"));
    }

    #[test]
    fn test_correlation_id_falls_back_to_operation() {
        let service = service_over_stub();
        let metadata = service.metadata(&RequestContext::empty(), OP_ORDER_STATUS_UPDATE);
        assert_eq!(
            metadata.correlation_id.as_deref(),
            Some("order.status.update")
        );
        assert!(metadata.request_id.is_none());
    }

    #[test]
    fn test_publish_over_unsupported_bus_surfaces_error() {
        let service = service_over_stub();
        let order = Order::new(Uuid::new_v4(), vec![], chrono::Utc::now());

        let result = service.publish_order_created(&order, &RequestContext::empty());
        assert!(matches!(result, Err(PublishError::Unsupported(_))));
    }
}
