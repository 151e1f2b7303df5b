use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::database::models::UserView;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

/// GET /api/auth/me - Public view of the authenticated user
pub async fn me(State(state): State<AppState>, Extension(auth): Extension<AuthUser>) -> ApiResult<UserView> {
    let user = state
        .store
        .user_by_id(auth.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    Ok(ApiResponse::success(UserView::from(&user)))
}
