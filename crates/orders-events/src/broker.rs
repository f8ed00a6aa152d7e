//! Broker-backed event bus (unimplemented).
//!
//! Placeholder for a future external-broker integration. It implements
//! the same [`EventBus`] interface as the in-memory bus so wiring stays
//! identical once a real backend lands, but until then every operation
//! fails fast with an explicit error instead of being selectable
//! silently.

use std::sync::Arc;

use async_trait::async_trait;

use orders_core::event::{EventType, OrderEvent};

use crate::bus::{CloseError, EventBus, EventHandler, PublishError, SubscribeError};

const NOT_IMPLEMENTED: &str = "broker event bus is not implemented; use the in-memory bus";

/// Stub [`EventBus`] for an external message broker.
#[derive(Debug, Clone)]
pub struct BrokerEventBus {
    brokers: Vec<String>,
    topic: String,
}

impl BrokerEventBus {
    /// Records the intended broker endpoints and topic. The bus is not
    /// usable: every operation returns an explicit error.
    #[must_use]
    pub fn new(brokers: Vec<String>, topic: impl Into<String>) -> Self {
        Self {
            brokers,
            topic: topic.into(),
        }
    }

    /// Broker endpoints this bus would connect to.
    #[must_use]
    pub fn brokers(&self) -> &[String] {
        &self.brokers
    }

    /// Topic this bus would publish to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl EventBus for BrokerEventBus {
    fn publish(&self, _event: OrderEvent) -> Result<(), PublishError> {
        Err(PublishError::Unsupported(NOT_IMPLEMENTED))
    }

    fn subscribe(
        &self,
        _event_type: EventType,
        _handler: Arc<dyn EventHandler>,
    ) -> Result<(), SubscribeError> {
        Err(SubscribeError::Unsupported(NOT_IMPLEMENTED))
    }

    async fn close(&self) -> Result<(), CloseError> {
        Err(CloseError::Unsupported(NOT_IMPLEMENTED))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use orders_core::event::EventMetadata;
    use orders_core::order::Order;

    use super::*;

    #[tokio::test]
    async fn test_every_operation_fails_explicitly() {
        let bus = BrokerEventBus::new(vec!["localhost:9092".to_string()], "orders.events");

        let order = Order::new(Uuid::new_v4(), vec![], Utc::now());
        let event = OrderEvent::order_created(
            &order,
            EventMetadata {
                request_id: None,
                user_agent: None,
                ip_address: None,
                source: "service_orders".to_string(),
                correlation_id: None,
            },
            Utc::now(),
        );

        assert!(matches!(
            bus.publish(event),
            Err(PublishError::Unsupported(_))
        ));
        assert!(matches!(
            bus.subscribe(
                EventType::OrderCreated,
                Arc::new(crate::handlers::LoggingHandler)
            ),
            Err(SubscribeError::Unsupported(_))
        ));
        assert!(matches!(bus.close().await, Err(CloseError::Unsupported(_))));
        assert_eq!(bus.topic(), "orders.events");
        assert_eq!(bus.brokers().len(), 1);
    }
}
