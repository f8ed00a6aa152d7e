//! Shared application state.

use std::sync::Arc;

use orders_core::clock::Clock;
use orders_core::repository::OrderRepository;
use orders_events::service::EventService;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Order persistence.
    pub orders: Arc<dyn OrderRepository>,
    /// Domain-event façade.
    pub events: Arc<EventService>,
    /// Time source.
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        events: Arc<EventService>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            orders,
            events,
            clock,
        }
    }
}
