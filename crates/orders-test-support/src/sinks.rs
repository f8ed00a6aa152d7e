//! Notification and audit sink doubles.

use std::sync::Mutex;

use uuid::Uuid;

use orders_events::bus::HandlerError;
use orders_events::handlers::{AuditSink, NotificationSink};

/// Notification sink that stores deliveries in memory.
#[derive(Debug, Default)]
pub struct MemoryNotificationSink {
    deliveries: Mutex<Vec<(Uuid, String)>>,
}

impl MemoryNotificationSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the recorded `(user_id, message)` deliveries.
    #[must_use]
    pub fn deliveries(&self) -> Vec<(Uuid, String)> {
        self.deliveries.lock().unwrap().clone()
    }
}

impl NotificationSink for MemoryNotificationSink {
    fn deliver(&self, user_id: Uuid, message: &str) -> Result<(), HandlerError> {
        self.deliveries
            .lock()
            .unwrap()
            .push((user_id, message.to_string()));
        Ok(())
    }
}

/// Audit sink that stores records in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<serde_json::Value>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the appended records.
    #[must_use]
    pub fn records(&self) -> Vec<serde_json::Value> {
        self.records.lock().unwrap().clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, record: &serde_json::Value) -> Result<(), HandlerError> {
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}
