//! Alert Routes

use aggregator::AlertRecord;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::view::{DashboardRequest, DashboardView};
use crate::AppContext;

/// Query parameters for alerts endpoints
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Search text, `!` prefix to exclude
    #[serde(default)]
    pub search: String,
}

/// Get the filtered dashboard view
pub async fn get_alerts(
    State(state): State<Arc<AppContext>>,
    Query(params): Query<SearchQuery>,
) -> Json<DashboardView> {
    debug!("Serving alerts for search {:?}", params.search);
    let request = DashboardRequest {
        search: params.search,
        ..Default::default()
    };
    Json(state.dashboard(request).await)
}

/// Apply silence changes and a search in one request
pub async fn post_alerts(
    State(state): State<Arc<AppContext>>,
    Json(request): Json<DashboardRequest>,
) -> Json<DashboardView> {
    debug!(
        "Dashboard update: {} silence, {} unsilence, search {:?}",
        request.silence.len(),
        request.unsilence.len(),
        request.search
    );
    Json(state.dashboard(request).await)
}

/// Flat rows with the trailing refresh-time sentinel
pub async fn get_rows(
    State(state): State<Arc<AppContext>>,
    Query(params): Query<SearchQuery>,
) -> Json<Vec<AlertRecord>> {
    Json(state.dashboard_rows(&params.search).await)
}
