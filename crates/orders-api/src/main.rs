//! Orders service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;

use orders_api::config::{AppConfig, EventBusKind};
use orders_api::error::AppError;
use orders_api::state::AppState;
use orders_core::clock::{Clock, SystemClock};
use orders_events::bus::{EventBus, InMemoryEventBus};
use orders_events::service::EventService;
use orders_events::stats::EventStats;
use orders_storage::PgOrderRepository;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("starting orders service");

    let config = AppConfig::from_env()?;

    // Create database connection pool.
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;

    // Build the event pipeline.
    let stats = Arc::new(EventStats::new());
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let bus: Arc<dyn EventBus> = match config.event_bus {
        EventBusKind::InMemory => Arc::new(InMemoryEventBus::new(Arc::clone(&stats))),
        EventBusKind::Broker => {
            return Err(AppError::Config(
                "EVENT_BUS=broker selected but the broker-backed bus is not implemented; \
                 use EVENT_BUS=memory"
                    .to_string(),
            ));
        }
    };
    let events = Arc::new(EventService::new(bus, stats, Arc::clone(&clock)));

    // Build application state and router.
    let orders = Arc::new(PgOrderRepository::new(pool));
    let state = AppState::new(orders, Arc::clone(&events), clock);
    let app = orders_api::app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|err| AppError::Config(format!("invalid HOST:PORT combination: {err}")))?;
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Drain buffered events before exiting so nothing accepted is lost.
    tracing::info!("shutdown signal received, closing event pipeline");
    events.close().await?;
    tracing::info!("orders service stopped");

    Ok(())
}

/// Resolves when the process receives SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        _ = terminate => {}
    }
}
