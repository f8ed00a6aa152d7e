//! Order CRUD routes.
//!
//! Every mutation publishes a domain event after its repository write
//! succeeds. Publication is best-effort: failures are logged and never
//! bleed into the HTTP response, because the order change is already
//! committed by the time the event is built.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use orders_core::order::{Order, OrderItem, OrderStatus};
use orders_core::repository::{OrderListQuery, SortField, SortOrder};

use crate::auth::UserContext;
use crate::error::ApiError;
use crate::extract::RequestMeta;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Body of `POST /v1/orders`.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Line items; at least one required.
    pub items: Vec<OrderItem>,
}

/// Body of `PUT /v1/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    /// Target status.
    pub status: OrderStatus,
}

/// Raw query parameters of `GET /v1/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    limit: Option<String>,
    offset: Option<String>,
    status: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

/// Response payload of `GET /v1/orders`.
#[derive(Debug, serde::Serialize)]
pub struct OrderListData {
    /// Orders on this page.
    pub orders: Vec<Order>,
    /// Total matching orders.
    pub total: i64,
    /// Page size used.
    pub limit: i64,
    /// Offset used.
    pub offset: i64,
}

/// Returns the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/{id}", get(get_order))
        .route("/{id}/status", put(update_order_status))
        .route("/{id}/cancel", put(cancel_order).post(cancel_order))
}

/// POST /v1/orders
async fn create_order(
    State(state): State<AppState>,
    user: UserContext,
    RequestMeta(ctx): RequestMeta,
    body: String,
) -> Result<(StatusCode, Json<ApiResponse<Order>>), ApiError> {
    let request: CreateOrderRequest = parse_body(&body)?;
    validate_items(&request.items)?;

    if !state.orders.user_exists(user.user_id).await? {
        return Err(ApiError::Validation("user does not exist".to_string()));
    }

    let order = Order::new(user.user_id, request.items, state.clock.now());
    state.orders.create(&order).await?;
    tracing::info!(
        order_id = %order.id,
        user_id = %order.user_id,
        items = order.items.len(),
        total_sum = order.total_sum,
        "order created"
    );

    if let Err(err) = state.events.publish_order_created(&order, &ctx) {
        tracing::warn!(order_id = %order.id, error = %err, "failed to publish order.created");
    }

    Ok((StatusCode::CREATED, Json(ApiResponse::success(order))))
}

/// GET /v1/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    user: UserContext,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let order = state.orders.get_by_id(order_id).await?;
    user.authorize_order_access(order.user_id)?;

    Ok(Json(ApiResponse::success(order)))
}

/// GET /v1/orders
async fn list_orders(
    State(state): State<AppState>,
    user: UserContext,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<OrderListData>>, ApiError> {
    let query = list_query_from_params(&params)?;
    let page = state.orders.list_by_user(user.user_id, &query).await?;
    tracing::debug!(
        user_id = %user.user_id,
        found = page.orders.len(),
        limit = page.limit,
        offset = page.offset,
        "orders listed"
    );

    Ok(Json(ApiResponse::success(OrderListData {
        orders: page.orders,
        total: page.total,
        limit: page.limit,
        offset: page.offset,
    })))
}

/// PUT /v1/orders/{id}/status
async fn update_order_status(
    State(state): State<AppState>,
    user: UserContext,
    RequestMeta(ctx): RequestMeta,
    Path(id): Path<String>,
    body: String,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let order_id = parse_order_id(&id)?;
    let request: UpdateOrderStatusRequest = parse_body(&body)?;

    let order = state.orders.get_by_id(order_id).await?;
    user.authorize_order_access(order.user_id)?;
    if !order.can_be_updated() {
        return Err(ApiError::Validation(format!(
            "cannot update order with status '{}'",
            order.status
        )));
    }

    let old_status = order.status;
    state.orders.update_status(order_id, request.status).await?;
    tracing::info!(
        order_id = %order_id,
        old_status = %old_status,
        new_status = %request.status,
        "order status updated"
    );

    if let Err(err) = state.events.publish_order_status_updated(
        order_id,
        order.user_id,
        user.user_id,
        old_status,
        request.status,
        &ctx,
    ) {
        tracing::warn!(order_id = %order_id, error = %err, "failed to publish order.status.updated");
    }

    let updated = state.orders.get_by_id(order_id).await?;
    Ok(Json(ApiResponse::success(updated)))
}

/// PUT|POST /v1/orders/{id}/cancel
async fn cancel_order(
    State(state): State<AppState>,
    user: UserContext,
    RequestMeta(ctx): RequestMeta,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Order>>, ApiError> {
    let order_id = parse_order_id(&id)?;

    let order = state.orders.get_by_id(order_id).await?;
    user.authorize_order_access(order.user_id)?;
    if !order.can_be_cancelled() {
        return Err(ApiError::Validation(format!(
            "cannot cancel order with status '{}'",
            order.status
        )));
    }

    let old_status = order.status;
    state.orders.cancel(order_id).await?;
    tracing::info!(order_id = %order_id, old_status = %old_status, "order cancelled");

    if let Err(err) = state.events.publish_order_cancelled(
        order_id,
        order.user_id,
        user.user_id,
        old_status,
        &ctx,
    ) {
        tracing::warn!(order_id = %order_id, error = %err, "failed to publish cancellation");
    }

    let cancelled = state.orders.get_by_id(order_id).await?;
    Ok(Json(ApiResponse::success(cancelled)))
}

fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|_| ApiError::Validation("invalid request body".to_string()))
}

fn parse_order_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::Validation("invalid order id".to_string()))
}

fn validate_items(items: &[OrderItem]) -> Result<(), ApiError> {
    if items.is_empty() {
        return Err(ApiError::Validation(
            "order must contain at least one item".to_string(),
        ));
    }
    for item in items {
        if item.product.trim().is_empty() {
            return Err(ApiError::Validation(
                "item product must not be empty".to_string(),
            ));
        }
        if item.quantity == 0 {
            return Err(ApiError::Validation(
                "item quantity must be at least 1".to_string(),
            ));
        }
        if item.price < 0.0 {
            return Err(ApiError::Validation(
                "item price must not be negative".to_string(),
            ));
        }
    }
    Ok(())
}

/// Builds a repository query from raw parameters. Out-of-range limit and
/// offset values fall back to the defaults; invalid status, sort, or
/// order values are rejected.
fn list_query_from_params(params: &ListParams) -> Result<OrderListQuery, ApiError> {
    let mut query = OrderListQuery::default();

    if let Some(limit) = params.limit.as_deref().and_then(|s| s.parse::<i64>().ok()) {
        if (1..=100).contains(&limit) {
            query.limit = limit;
        }
    }
    if let Some(offset) = params.offset.as_deref().and_then(|s| s.parse::<i64>().ok()) {
        if offset >= 0 {
            query.offset = offset;
        }
    }
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status
            .parse()
            .map_err(|_| ApiError::Validation(format!("unknown status filter: {status}")))?;
        query.status = Some(status);
    }
    if let Some(sort) = params.sort.as_deref().filter(|s| !s.is_empty()) {
        query.sort = match sort {
            "created_at" => SortField::CreatedAt,
            "updated_at" => SortField::UpdatedAt,
            "total_sum" => SortField::TotalSum,
            other => {
                return Err(ApiError::Validation(format!("invalid sort field: {other}")));
            }
        };
    }
    if let Some(order) = params.order.as_deref().filter(|s| !s.is_empty()) {
        query.order = match order {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => {
                return Err(ApiError::Validation(format!("invalid sort order: {other}")));
            }
        };
    }

    Ok(query)
}
