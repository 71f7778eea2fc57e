//! Silence Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::view::{DashboardRequest, DashboardView};
use crate::AppContext;

/// Request body for silencing hosts
#[derive(Debug, Deserialize)]
pub struct SilenceRequest {
    pub hostnames: Vec<String>,
    /// Search applied to the returned view
    #[serde(default)]
    pub search: String,
}

/// Response for the silence list
#[derive(Debug, Serialize, Deserialize)]
pub struct SilenceList {
    pub hostnames: Vec<String>,
    pub count: usize,
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// List silenced hostnames
pub async fn list_silences(
    State(state): State<Arc<AppContext>>,
) -> Result<Json<SilenceList>, (StatusCode, Json<ErrorResponse>)> {
    let listed = state
        .with_ledger(|ledger| ledger.list_all())
        .await
        .map_err(|e| e.to_string())
        .and_then(|result| result.map_err(|e| e.to_string()));

    match listed {
        Ok(hostnames) => Ok(Json(SilenceList {
            count: hostnames.len(),
            hostnames,
        })),
        Err(error) => {
            warn!("Error getting silenced hosts: {}", error);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse { error }),
            ))
        }
    }
}

/// Silence hostnames and return the updated view
pub async fn add_silences(
    State(state): State<Arc<AppContext>>,
    Json(body): Json<SilenceRequest>,
) -> Json<DashboardView> {
    let request = DashboardRequest {
        search: body.search,
        silence: body.hostnames,
        ..Default::default()
    };
    Json(state.dashboard(request).await)
}

/// Unsilence one hostname and return the updated view
pub async fn remove_silence(
    State(state): State<Arc<AppContext>>,
    Path(hostname): Path<String>,
) -> Json<DashboardView> {
    let request = DashboardRequest {
        unsilence: vec![hostname],
        ..Default::default()
    };
    Json(state.dashboard(request).await)
}
