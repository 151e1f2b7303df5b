use axum::extract::State;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{dashboard as build_dashboard, Dashboard};

/// GET /api/dashboard - Case counts by status, latest cases and all alerts
pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Dashboard> {
    let board = build_dashboard(state.store.as_ref(), state.config.api.recent_cases_limit).await?;
    Ok(ApiResponse::success(board))
}
