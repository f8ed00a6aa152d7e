//! Event handler doubles.

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use orders_core::event::OrderEvent;
use orders_events::bus::{EventHandler, HandlerError};

/// Handler that records every event it receives, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    name: &'static str,
    events: Mutex<Vec<OrderEvent>>,
}

impl RecordingHandler {
    /// Creates a named recording handler.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            events: Mutex::new(Vec::new()),
        }
    }

    /// Copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<OrderEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Ids of the recorded events, in arrival order.
    #[must_use]
    pub fn event_ids(&self) -> Vec<Uuid> {
        self.events.lock().unwrap().iter().map(|e| e.id).collect()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn handle(&self, event: &OrderEvent) -> Result<(), HandlerError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// Handler that fails every invocation.
#[derive(Debug, Clone, Copy)]
pub struct FailingHandler;

#[async_trait]
impl EventHandler for FailingHandler {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn handle(&self, _event: &OrderEvent) -> Result<(), HandlerError> {
        Err(HandlerError::Other("simulated handler failure".to_string()))
    }
}
