// handlers/public/auth/login.rs - POST /api/auth/login handler

use axum::extract::State;
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::{issue_pair, verify_password, LoginRequest, LoginResponse};
use crate::database::models::UserView;
use crate::database::ValidationErrors;
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};

const INVALID_CREDENTIALS: &str = "Credenciales incorrectas.";

/// POST /api/auth/login - Exchange username and password for a token pair
///
/// Expected Input:
/// ```json
/// { "username": "admin", "password": "..." }
/// ```
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "data": {
///     "access": "eyJ...",
///     "refresh": "eyJ...",
///     "user": { "id": 1, "username": "admin", "is_admin": true, "is_staff": true }
///   }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let username = body.username.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();

    let mut errors = ValidationErrors::new();
    errors.require_text("username", username);
    errors.require_text("password", password);
    errors.into_result()?;

    let Some(user) = state.store.user_by_username(username).await? else {
        warn!("Login failed for unknown user '{}'", username);
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!("Login failed for '{}': wrong password", username);
        return Err(ApiError::bad_request(INVALID_CREDENTIALS));
    }

    if !user.is_active {
        warn!("Login refused for inactive user '{}'", username);
        return Err(ApiError::bad_request("User account is disabled."));
    }

    let tokens = issue_pair(&user, &state.config.security)?;
    info!("User '{}' logged in", user.username);

    Ok(ApiResponse::success(LoginResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user: UserView::from(&user),
    }))
}
