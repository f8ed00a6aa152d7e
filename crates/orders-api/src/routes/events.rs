//! Event-pipeline monitoring endpoint.

use axum::extract::State;
use axum::{Json, Router, routing::get};
use serde::Serialize;

use orders_events::service::SERVICE_NAME;
use orders_events::stats::StatsSnapshot;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Payload of the statistics endpoint.
#[derive(Debug, Serialize)]
pub struct EventStatsData {
    /// Current pipeline counters.
    pub statistics: StatsSnapshot,
    /// Reporting service.
    pub service: &'static str,
    /// Time the snapshot was taken, RFC 3339.
    pub timestamp: String,
    /// Human-readable description.
    pub description: &'static str,
}

/// GET /v1/events/stats
async fn event_stats(State(state): State<AppState>) -> Json<ApiResponse<EventStatsData>> {
    Json(ApiResponse::success(EventStatsData {
        statistics: state.events.stats(),
        service: SERVICE_NAME,
        timestamp: state.clock.now().to_rfc3339(),
        description: "domain event statistics",
    }))
}

/// Returns the events monitoring router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(event_stats))
}
