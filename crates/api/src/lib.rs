//! Alert Dashboard API Server
//!
//! JSON API over the aggregated alert snapshot: search, silencing,
//! health, and Prometheus metrics.

use aggregator::SnapshotStore;
use axum::{
    extract::State,
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get},
    Json, Router,
};
use chrono::{DateTime, Utc};
use collector::{CycleState, RefreshCycle, SourceCollector};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use silencing::SilenceLedger;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod routes;
mod settings;
mod shutdown;
mod view;

pub use settings::{Settings, SettingsError, CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};
pub use shutdown::wait_for_shutdown;
pub use view::{DashboardRequest, DashboardView};

/// Application state shared across handlers
pub struct AppContext {
    /// Latest published snapshot
    pub snapshots: Arc<SnapshotStore>,
    /// Silenced hostnames
    pub ledger: Arc<SilenceLedger>,
    /// Refresh cycle progress
    pub refresh_state: watch::Receiver<CycleState>,
    /// Prometheus exposition, when the recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: Instant,
}

impl AppContext {
    /// Create new application state
    pub fn new(
        snapshots: Arc<SnapshotStore>,
        ledger: Arc<SilenceLedger>,
        refresh_state: watch::Receiver<CycleState>,
    ) -> Self {
        Self {
            snapshots,
            ledger,
            refresh_state,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub refresh_state: String,
    pub last_sync: Option<DateTime<Utc>>,
    pub server_count: usize,
    pub alert_count: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppContext>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/alerts",
            get(routes::alerts::get_alerts).post(routes::alerts::post_alerts),
        )
        .route("/api/v1/alerts/rows", get(routes::alerts::get_rows))
        .route(
            "/api/v1/silences",
            get(routes::silences::list_silences).post(routes::silences::add_silences),
        )
        .route(
            "/api/v1/silences/:hostname",
            delete(routes::silences::remove_silence),
        )
        .route("/metrics", get(metrics_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppContext>>) -> impl IntoResponse {
    let snapshot = state.snapshots.get();
    let refresh_state = *state.refresh_state.borrow();

    Json(HealthResponse {
        status: (if snapshot.last_sync.is_some() { "healthy" } else { "starting" }).to_string(),
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        refresh_state: refresh_state.as_str().to_string(),
        last_sync: snapshot.last_sync,
        server_count: snapshot.server_count(),
        alert_count: snapshot.alert_count(),
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppContext>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics disabled".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(level: Level, json: bool) {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.expect("Failed to set tracing subscriber");
}

/// Install the global Prometheus recorder
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(handle),
        Err(e) => {
            warn!("Prometheus recorder not installed: {}", e);
            None
        }
    }
}

/// Run the server until a shutdown signal arrives
pub async fn run_server(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = if settings.metrics_enabled {
        init_metrics()
    } else {
        None
    };

    let snapshots = Arc::new(SnapshotStore::new());
    let ledger = Arc::new(SilenceLedger::new(settings.silence_file.clone()));

    let collector = SourceCollector::new(settings.collector_config())?;
    let cycle = RefreshCycle::new(collector, Arc::clone(&snapshots), settings.refresh_interval())
        .retain_on_total_failure(settings.retain_on_total_failure);

    // Serve nothing until the first snapshot exists
    cycle.run_once().await;

    let mut context = AppContext::new(Arc::clone(&snapshots), ledger, cycle.subscribe());
    if let Some(handle) = metrics {
        context = context.with_metrics(handle);
    }

    let (stop_tx, stop_rx) = watch::channel(false);
    let refresh = Arc::new(cycle).spawn(stop_rx);

    let app = create_router(Arc::new(context));
    let listener = tokio::net::TcpListener::bind(&settings.listen_addr).await?;
    info!("Server listening on {}", settings.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            wait_for_shutdown().await;
            info!("Shutting down server...");
            let _ = stop_tx.send(true);
        })
        .await?;

    if let Err(e) = refresh.await {
        warn!("Refresh loop ended abnormally: {}", e);
    }
    info!("Server stopped gracefully");
    Ok(())
}
