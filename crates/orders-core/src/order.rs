//! Order model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an order.
///
/// The serialized values are the platform's original wire strings and must
/// not change: other services and stored rows depend on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Newly placed order.
    #[serde(rename = "создан")]
    Created,
    /// Order is being worked on.
    #[serde(rename = "в работе")]
    InWork,
    /// Order has been fulfilled.
    #[serde(rename = "выполнен")]
    Completed,
    /// Order was cancelled (terminal).
    #[serde(rename = "отменён")]
    Cancelled,
}

impl OrderStatus {
    /// Returns the wire representation of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Created => "создан",
            OrderStatus::InWork => "в работе",
            OrderStatus::Completed => "выполнен",
            OrderStatus::Cancelled => "отменён",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = crate::error::OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "создан" => Ok(OrderStatus::Created),
            "в работе" => Ok(OrderStatus::InWork),
            "выполнен" => Ok(OrderStatus::Completed),
            "отменён" => Ok(OrderStatus::Cancelled),
            other => Err(crate::error::OrderError::Validation(format!(
                "unknown order status: {other}"
            ))),
        }
    }
}

/// A single line item in an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product name.
    pub product: String,
    /// Units ordered.
    pub quantity: u32,
    /// Unit price.
    pub price: f64,
}

/// An order aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: Uuid,
    /// Owner of the order.
    pub user_id: Uuid,
    /// Line items.
    pub items: Vec<OrderItem>,
    /// Current status.
    pub status: OrderStatus,
    /// Total price across all items.
    pub total_sum: f64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new order in the `создан` status with the total computed
    /// from its items.
    #[must_use]
    pub fn new(user_id: Uuid, items: Vec<OrderItem>, now: DateTime<Utc>) -> Self {
        let total_sum = total_of(&items);
        Self {
            id: Uuid::new_v4(),
            user_id,
            items,
            status: OrderStatus::Created,
            total_sum,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the status may still be changed.
    #[must_use]
    pub fn can_be_updated(&self) -> bool {
        matches!(self.status, OrderStatus::Created | OrderStatus::InWork)
    }

    /// Whether the order may still be cancelled.
    #[must_use]
    pub fn can_be_cancelled(&self) -> bool {
        matches!(self.status, OrderStatus::Created | OrderStatus::InWork)
    }
}

/// Total price of a set of line items.
#[must_use]
pub fn total_of(items: &[OrderItem]) -> f64 {
    items
        .iter()
        .map(|item| item.price * f64::from(item.quantity))
        .sum()
}
