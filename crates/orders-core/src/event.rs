//! Domain events for the orders service.
//!
//! An event is an immutable record of something that already happened to an
//! order. It is constructed exactly once, after the database mutation has
//! committed, and handed to the event bus; handlers never mutate it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::order::{Order, OrderItem, OrderStatus};

/// Version of the event payload shape, bumped on incompatible changes so
/// consumers can branch on it.
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Closed set of event types the orders service emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// An order was created.
    #[serde(rename = "order.created")]
    OrderCreated,
    /// An order's status changed.
    #[serde(rename = "order.status.updated")]
    OrderStatusUpdated,
}

impl EventType {
    /// Every known event type, in declaration order.
    pub const ALL: [EventType; 2] = [EventType::OrderCreated, EventType::OrderStatusUpdated];

    /// Returns the wire name of the event type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::OrderCreated => "order.created",
            EventType::OrderStatusUpdated => "order.status.updated",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Correlation and tracing fields attached to every event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Request id forwarded by the gateway, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Client user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Peer address of the originating request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Originating service name.
    pub source: String,
    /// Identifier linking related events and requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Payload of an `order.created` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreated {
    /// The created order.
    pub order_id: Uuid,
    /// Owner of the order.
    pub user_id: Uuid,
    /// Line items at creation time.
    pub items: Vec<OrderItem>,
    /// Order total.
    pub total_sum: f64,
    /// Status the order was created in.
    pub status: OrderStatus,
    /// Creation time of the order.
    pub created_at: DateTime<Utc>,
}

/// Payload of an `order.status.updated` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusUpdated {
    /// The affected order.
    pub order_id: Uuid,
    /// Owner of the order.
    pub user_id: Uuid,
    /// Status before the change.
    pub old_status: OrderStatus,
    /// Status after the change.
    pub new_status: OrderStatus,
    /// Time of the change.
    pub updated_at: DateTime<Utc>,
    /// Actor who performed the change; may differ from the owner
    /// (e.g. an admin cancelling another user's order).
    pub updated_by: Uuid,
}

/// Event payload variants, tagged by event type.
///
/// The payload is decoded exactly once, at construction or
/// deserialization, so handlers always receive the typed variant and
/// never reconstruct it from a generic map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEventKind {
    /// An order was created.
    #[serde(rename = "order.created")]
    Created(OrderCreated),
    /// An order's status changed.
    #[serde(rename = "order.status.updated")]
    StatusUpdated(OrderStatusUpdated),
}

impl OrderEventKind {
    /// The event type tag of this payload.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            OrderEventKind::Created(_) => EventType::OrderCreated,
            OrderEventKind::StatusUpdated(_) => EventType::OrderStatusUpdated,
        }
    }

    /// The payload serialized on its own, without the type tag.
    #[must_use]
    pub fn to_payload(&self) -> serde_json::Value {
        // Serialization of derived Serialize types to Value is infallible.
        match self {
            OrderEventKind::Created(data) => serde_json::to_value(data),
            OrderEventKind::StatusUpdated(data) => serde_json::to_value(data),
        }
        .expect("event payload serialization is infallible")
    }
}

/// Immutable domain event envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderEvent {
    /// Unique event identifier.
    pub id: Uuid,
    /// The order this event concerns.
    pub aggregate_id: Uuid,
    /// Owner of the order at the time of the event.
    pub user_id: Uuid,
    /// Creation time of the event, set once.
    pub timestamp: DateTime<Utc>,
    /// Payload schema version.
    #[serde(rename = "version")]
    pub schema_version: u32,
    /// Correlation and tracing fields.
    pub metadata: EventMetadata,
    /// Typed payload, serialized as `"type"` + `"data"`.
    #[serde(flatten)]
    pub kind: OrderEventKind,
}

impl OrderEvent {
    /// Builds an `order.created` event from a just-persisted order.
    #[must_use]
    pub fn order_created(order: &Order, metadata: EventMetadata, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            aggregate_id: order.id,
            user_id: order.user_id,
            timestamp: now,
            schema_version: EVENT_SCHEMA_VERSION,
            metadata,
            kind: OrderEventKind::Created(OrderCreated {
                order_id: order.id,
                user_id: order.user_id,
                items: order.items.clone(),
                total_sum: order.total_sum,
                status: order.status,
                created_at: order.created_at,
            }),
        }
    }

    /// Builds an `order.status.updated` event for a committed transition.
    #[must_use]
    pub fn order_status_updated(
        order_id: Uuid,
        user_id: Uuid,
        updated_by: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
        metadata: EventMetadata,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            aggregate_id: order_id,
            user_id,
            timestamp: now,
            schema_version: EVENT_SCHEMA_VERSION,
            metadata,
            kind: OrderEventKind::StatusUpdated(OrderStatusUpdated {
                order_id,
                user_id,
                old_status,
                new_status,
                updated_at: now,
                updated_by,
            }),
        }
    }

    /// The event type tag of this event.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }
}
