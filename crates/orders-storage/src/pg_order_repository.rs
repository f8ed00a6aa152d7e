//! `PostgreSQL` implementation of the `OrderRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, QueryBuilder, Row};
use uuid::Uuid;

use orders_core::error::OrderError;
use orders_core::order::{Order, OrderItem, OrderStatus};
use orders_core::repository::{
    OrderListQuery, OrderPage, OrderRepository, SortField, SortOrder,
};

const SELECT_ORDER_COLUMNS: &str =
    "SELECT id, user_id, items, status, total_sum, created_at, updated_at FROM orders";

// Postgres error code for foreign-key violations.
const FK_VIOLATION: &str = "23503";

/// PostgreSQL-backed order repository.
#[derive(Debug, Clone)]
pub struct PgOrderRepository {
    pool: PgPool,
}

impl PgOrderRepository {
    /// Creates a new `PgOrderRepository`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn create(&self, order: &Order) -> Result<(), OrderError> {
        let items = serde_json::to_value(&order.items)
            .map_err(|err| OrderError::Infrastructure(format!("failed to encode items: {err}")))?;

        let result = sqlx::query(
            "INSERT INTO orders (id, user_id, items, status, total_sum, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(items)
        .bind(order.status.as_str())
        .bind(order.total_sum)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) if is_fk_violation(&err) => Err(OrderError::Validation(format!(
                "user {} does not exist",
                order.user_id
            ))),
            Err(err) => Err(infrastructure(err)),
        }
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Order, OrderError> {
        let row = sqlx::query(&format!("{SELECT_ORDER_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        match row {
            Some(row) => decode_order(&row),
            None => Err(OrderError::NotFound(id)),
        }
    }

    async fn list_by_user(
        &self,
        user_id: Uuid,
        query: &OrderListQuery,
    ) -> Result<OrderPage, OrderError> {
        let mut count: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM orders WHERE user_id = ");
        count.push_bind(user_id);
        if let Some(status) = query.status {
            count.push(" AND status = ").push_bind(status.as_str());
        }
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(infrastructure)?
            .try_get(0)
            .map_err(infrastructure)?;

        let mut select: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(SELECT_ORDER_COLUMNS);
        select.push(" WHERE user_id = ").push_bind(user_id);
        if let Some(status) = query.status {
            select.push(" AND status = ").push_bind(status.as_str());
        }
        // Sort field and direction come from closed enums, never from the
        // caller's raw input.
        select.push(" ");
        select.push(order_clause(query.sort, query.order));
        select.push(" LIMIT ").push_bind(query.limit);
        select.push(" OFFSET ").push_bind(query.offset);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(infrastructure)?;

        let orders = rows
            .iter()
            .map(decode_order)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(OrderPage {
            orders,
            total,
            limit: query.limit,
            offset: query.offset,
        })
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<(), OrderError> {
        let result = sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(OrderError::NotFound(id));
        }
        Ok(())
    }

    async fn cancel(&self, id: Uuid) -> Result<(), OrderError> {
        self.update_status(id, OrderStatus::Cancelled).await
    }

    async fn user_exists(&self, user_id: Uuid) -> Result<bool, OrderError> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(infrastructure)
    }
}

fn infrastructure(err: sqlx::Error) -> OrderError {
    OrderError::Infrastructure(err.to_string())
}

fn is_fk_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == FK_VIOLATION)
}

fn order_clause(sort: SortField, order: SortOrder) -> String {
    format!("ORDER BY {} {}", sort.as_column(), order.as_sql())
}

fn decode_order(row: &PgRow) -> Result<Order, OrderError> {
    let items: serde_json::Value = row.try_get("items").map_err(infrastructure)?;
    let status: String = row.try_get("status").map_err(infrastructure)?;
    order_from_parts(
        row.try_get("id").map_err(infrastructure)?,
        row.try_get("user_id").map_err(infrastructure)?,
        &items,
        &status,
        row.try_get("total_sum").map_err(infrastructure)?,
        row.try_get("created_at").map_err(infrastructure)?,
        row.try_get("updated_at").map_err(infrastructure)?,
    )
}

/// Rebuilds an [`Order`] from raw column values. A row that does not
/// decode is data corruption, reported as an infrastructure error.
fn order_from_parts(
    id: Uuid,
    user_id: Uuid,
    items: &serde_json::Value,
    status: &str,
    total_sum: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Result<Order, OrderError> {
    let items: Vec<OrderItem> = serde_json::from_value(items.clone()).map_err(|err| {
        OrderError::Infrastructure(format!("failed to decode items for order {id}: {err}"))
    })?;
    let status: OrderStatus = status.parse().map_err(|_| {
        OrderError::Infrastructure(format!("unknown status '{status}' for order {id}"))
    })?;

    Ok(Order {
        id,
        user_id,
        items,
        status,
        total_sum,
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_clause_uses_whitelisted_columns() {
        assert_eq!(
            order_clause(SortField::CreatedAt, SortOrder::Desc),
            "ORDER BY created_at DESC"
        );
        assert_eq!(
            order_clause(SortField::TotalSum, SortOrder::Asc),
            "ORDER BY total_sum ASC"
        );
        assert_eq!(
            order_clause(SortField::UpdatedAt, SortOrder::Asc),
            "ORDER BY updated_at ASC"
        );
    }

    #[test]
    fn test_order_from_parts_round_trips_items_and_status() {
        let id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let now = Utc::now();
        let items = serde_json::json!([
            {"product": "pen", "quantity": 2, "price": 1.5}
        ]);

        let order = order_from_parts(id, user_id, &items, "в работе", 3.0, now, now).unwrap();
        assert_eq!(order.status, OrderStatus::InWork);
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.items[0].product, "pen");
        assert_eq!(order.items[0].quantity, 2);
    }

    #[test]
    fn test_order_from_parts_rejects_unknown_status() {
        let now = Utc::now();
        let result = order_from_parts(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &serde_json::json!([]),
            "shipped",
            0.0,
            now,
            now,
        );
        assert!(matches!(result, Err(OrderError::Infrastructure(_))));
    }

    #[test]
    fn test_order_from_parts_rejects_malformed_items() {
        let now = Utc::now();
        let result = order_from_parts(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &serde_json::json!({"not": "a list"}),
            "создан",
            0.0,
            now,
            now,
        );
        assert!(matches!(result, Err(OrderError::Infrastructure(_))));
    }
}
