//! In-memory `OrderRepository` for API and handler tests.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use orders_core::error::OrderError;
use orders_core::order::{Order, OrderStatus};
use orders_core::repository::{OrderListQuery, OrderPage, OrderRepository, SortField, SortOrder};

/// Map-backed repository double with the same observable behavior as the
/// PostgreSQL implementation.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<Uuid, Order>>,
    users: Mutex<HashSet<Uuid>>,
}

impl InMemoryOrderRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user id so `user_exists` reports it.
    pub fn insert_user(&self, user_id: Uuid) {
        self.users.lock().unwrap().insert(user_id);
    }

    /// Seeds an order directly.
    pub fn insert_order(&self, order: Order) {
        self.orders.lock().unwrap().insert(order.id, order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), OrderError> {
        self.orders.lock().unwrap().insert(order.id, order.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order, OrderError> {
        self.orders
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(OrderError::NotFound(id))
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        query: &OrderListQuery,
    ) -> Result<OrderPage, OrderError> {
        let mut matching: Vec<Order> = self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|order| order.user_id == user_id)
            .filter(|order| query.status.is_none_or(|status| order.status == status))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            let ordering = match query.sort {
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
                SortField::TotalSum => a
                    .total_sum
                    .partial_cmp(&b.total_sum)
                    .unwrap_or(Ordering::Equal),
            };
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = i64::try_from(matching.len()).unwrap_or(i64::MAX);
        let offset = usize::try_from(query.offset).unwrap_or(0);
        let limit = usize::try_from(query.limit).unwrap_or(0);
        let orders = matching.into_iter().skip(offset).take(limit).collect();

        Ok(OrderPage {
            orders,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), OrderError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).ok_or(OrderError::NotFound(id))?;
        order.status = status;
        order.updated_at = chrono::Utc::now();
        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> Result<(), OrderError> {
        self.update_status(id, OrderStatus::Cancelled).await
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, OrderError> {
        Ok(self.users.lock().unwrap().contains(&user_id))
    }
}
