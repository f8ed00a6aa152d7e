//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;
use uuid::Uuid;

use orders_api::state::AppState;
use orders_core::clock::Clock;
use orders_core::order::{Order, OrderItem};
use orders_events::bus::InMemoryEventBus;
use orders_events::service::EventService;
use orders_events::stats::EventStats;
use orders_test_support::{FixedClock, InMemoryOrderRepository};

/// Fixed timestamp used across all integration tests.
pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// The app under test plus handles to observe and seed it.
pub struct TestApp {
    /// Router with the same structure as `main`.
    pub app: Router,
    /// In-memory repository for seeding.
    pub repo: Arc<InMemoryOrderRepository>,
    /// Event façade, e.g. for closing or stats assertions.
    pub events: Arc<EventService>,
}

/// Builds the full app router over the in-memory repository, a real
/// event pipeline, and a deterministic clock.
pub fn build_test_app() -> TestApp {
    let clock = fixed_clock();
    let stats = Arc::new(EventStats::new());
    let bus = Arc::new(InMemoryEventBus::new(Arc::clone(&stats)));
    let events = Arc::new(EventService::new(bus, stats, Arc::clone(&clock)));
    let repo = Arc::new(InMemoryOrderRepository::new());
    let state = AppState::new(
        Arc::clone(&repo) as Arc<dyn orders_core::repository::OrderRepository>,
        Arc::clone(&events),
        clock,
    );

    TestApp {
        app: orders_api::app(state),
        repo,
        events,
    }
}

/// A seeded user with identity headers.
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub roles: String,
}

impl TestUser {
    /// A regular user, registered in the repository.
    pub fn seeded(repo: &InMemoryOrderRepository) -> Self {
        let id = Uuid::new_v4();
        repo.insert_user(id);
        Self {
            id,
            email: format!("{id}@example.com"),
            roles: String::new(),
        }
    }

    /// An administrator, registered in the repository.
    pub fn admin(repo: &InMemoryOrderRepository) -> Self {
        let mut user = Self::seeded(repo);
        user.roles = "admin".to_string();
        user
    }
}

/// Builds a request carrying the user's identity headers.
pub fn authed_request(user: &TestUser, method: &str, uri: &str, body: Option<&serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user.id.to_string())
        .header("x-user-email", &user.email)
        .header("x-request-id", "test-req");
    if !user.roles.is_empty() {
        builder = builder.header("x-user-roles", &user.roles);
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Sends a request and decodes the JSON response.
pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
    (status, json)
}

/// Seeds an order owned by `user` and returns it.
pub fn seed_order(repo: &InMemoryOrderRepository, user: &TestUser, items: Vec<OrderItem>) -> Order {
    let order = Order::new(user.id, items, chrono::Utc::now());
    repo.insert_order(order.clone());
    order
}

/// A simple line item.
pub fn item(product: &str, quantity: u32, price: f64) -> OrderItem {
    OrderItem {
        product: product.to_string(),
        quantity,
        price,
    }
}
