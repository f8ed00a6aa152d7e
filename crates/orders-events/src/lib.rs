//! Orders Events — bounded, asynchronous domain-event fan-out.
//!
//! Order-mutating HTTP handlers publish events through the
//! [`service::EventService`] façade after their database change commits.
//! The façade hands events to an [`bus::EventBus`]; the in-memory bus
//! queues them (bounded, non-blocking) and a dedicated worker dispatches
//! each event concurrently to every subscribed handler. Handlers are
//! isolated from each other: one failing handler never affects its
//! siblings or the producer.

pub mod broker;
pub mod bus;
pub mod handlers;
pub mod service;
pub mod stats;

pub use broker::BrokerEventBus;
pub use bus::{
    CloseError, DEFAULT_QUEUE_CAPACITY, EventBus, EventHandler, HandlerError, InMemoryEventBus,
    PublishError, SubscribeError,
};
pub use service::{EventService, RequestContext, SERVICE_NAME};
pub use stats::{EventStats, StatsSnapshot};
