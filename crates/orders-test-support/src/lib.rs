//! Shared test mocks and utilities for the orders service.

mod clock;
mod handlers;
mod repository;
mod sinks;

pub use clock::FixedClock;
pub use handlers::{FailingHandler, RecordingHandler};
pub use repository::InMemoryOrderRepository;
pub use sinks::{MemoryAuditSink, MemoryNotificationSink};
