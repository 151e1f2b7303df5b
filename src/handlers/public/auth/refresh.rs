// handlers/public/auth/refresh.rs - POST /api/auth/refresh handler

use axum::extract::State;
use tracing::info;

use crate::app::AppState;
use crate::auth::{decode_token, issue_access, AccessToken, RefreshRequest, TokenKind};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};

/// POST /api/auth/refresh - Trade a refresh token for a new access token.
/// The refresh token itself is not rotated.
pub async fn refresh(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RefreshRequest>,
) -> ApiResult<AccessToken> {
    let token = body
        .refresh
        .filter(|token| !token.trim().is_empty())
        .ok_or_else(|| ApiError::field_error("refresh", "This field is required."))?;

    let claims = decode_token(token.trim(), TokenKind::Refresh, &state.config.security)?;

    let user = state
        .store
        .user_by_id(claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| ApiError::unauthorized("User not found or inactive"))?;

    let access = issue_access(&user, &state.config.security)?;
    info!("Issued new access token for '{}'", user.username);

    Ok(ApiResponse::success(AccessToken { access }))
}
