//! Order repository abstraction.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::OrderError;
use crate::order::{Order, OrderStatus};

/// Sort fields accepted by order listings. Kept as a closed enum so the
/// storage layer never interpolates caller-supplied strings into SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Sort by creation time.
    CreatedAt,
    /// Sort by last modification time.
    UpdatedAt,
    /// Sort by order total.
    TotalSum,
}

impl SortField {
    /// Column name for the field.
    #[must_use]
    pub fn as_column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::TotalSum => "total_sum",
        }
    }
}

/// Sort direction for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// SQL keyword for the direction.
    #[must_use]
    pub fn as_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Parameters for listing a user's orders.
#[derive(Debug, Clone)]
pub struct OrderListQuery {
    /// Page size, 1..=100.
    pub limit: i64,
    /// Rows to skip.
    pub offset: i64,
    /// Optional status filter.
    pub status: Option<OrderStatus>,
    /// Sort field.
    pub sort: SortField,
    /// Sort direction.
    pub order: SortOrder,
}

impl Default for OrderListQuery {
    fn default() -> Self {
        Self {
            limit: 10,
            offset: 0,
            status: None,
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
        }
    }
}

/// One page of a user's orders.
#[derive(Debug, Clone)]
pub struct OrderPage {
    /// Orders on this page.
    pub orders: Vec<Order>,
    /// Total matching rows across all pages.
    pub total: i64,
    /// Page size used.
    pub limit: i64,
    /// Offset used.
    pub offset: i64,
}

/// Repository trait for order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Persists a new order.
    async fn create(&self, order: &Order) -> Result<(), OrderError>;

    /// Loads an order by id.
    async fn get_by_id(&self, id: Uuid) -> Result<Order, OrderError>;

    /// Lists a user's orders with filtering, sorting and pagination.
    async fn list_by_user(
        &self,
        user_id: Uuid,
        query: &OrderListQuery,
    ) -> Result<OrderPage, OrderError>;

    /// Updates the status of an existing order.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), OrderError>;

    /// Moves an order to the terminal cancelled status.
    async fn cancel(&self, id: Uuid) -> Result<(), OrderError>;

    /// Whether a user row exists in the shared users table.
    async fn user_exists(&self, user_id: Uuid) -> Result<bool, OrderError>;
}
