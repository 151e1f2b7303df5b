// handlers/elevated/users.rs - /api/users handlers
//
// The protected bootstrap account (id 1) is invisible here: it is left out
// of listings and every per-id route answers 404 for it.

use axum::{extract::State, Extension};
use tracing::info;

use crate::app::AppState;
use crate::auth::hash_password;
use crate::database::models::{CreateUserRequest, NewUser, User, UserPatch, UserView, PROTECTED_USER_ID};
use crate::database::{Store, StoreError};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiResponse, ApiResult, AuthUser, NoContent};

const USERNAME_TAKEN: &str = "A user with that username already exists.";

async fn managed_user(store: &dyn Store, id: i64) -> Result<User, ApiError> {
    if id == PROTECTED_USER_ID {
        return Err(StoreError::NotFound("User").into());
    }
    store
        .user_by_id(id)
        .await?
        .ok_or_else(|| StoreError::NotFound("User").into())
}

fn username_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict(_) => ApiError::field_error("username", USERNAME_TAKEN),
        other => other.into(),
    }
}

/// GET /api/users - Every user except the protected account, by id
pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<UserView>> {
    let users = state
        .store
        .list_users()
        .await?
        .iter()
        .filter(|user| user.id != PROTECTED_USER_ID)
        .map(UserView::from)
        .collect();
    Ok(ApiResponse::success(users))
}

/// POST /api/users - Create a user; administrators are also staff
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(request): ApiJson<CreateUserRequest>,
) -> ApiResult<UserView> {
    let (username, password) = request.validate(state.config.security.min_password_length)?;

    if state.store.user_by_username(&username).await?.is_some() {
        return Err(ApiError::field_error("username", USERNAME_TAKEN));
    }

    let password_hash = hash_password(&password, state.config.security.password_hash_cost)?;
    let user = state
        .store
        .create_user(NewUser {
            username,
            password_hash,
            is_admin: request.is_admin,
            is_staff: request.is_admin,
        })
        .await
        .map_err(username_conflict)?;

    info!("Administrator '{}' created user '{}' (id {})", auth.username, user.username, user.id);
    Ok(ApiResponse::created(UserView::from(&user)))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<UserView> {
    let user = managed_user(state.store.as_ref(), id).await?;
    Ok(ApiResponse::success(UserView::from(&user)))
}

/// PATCH /api/users/:id - Rename a user or change their admin flag
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<UserPatch>,
) -> ApiResult<UserView> {
    patch.validate()?;
    managed_user(state.store.as_ref(), id).await?;
    let user = state
        .store
        .update_user(id, patch)
        .await
        .map_err(username_conflict)?;
    Ok(ApiResponse::success(UserView::from(&user)))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    let user = managed_user(state.store.as_ref(), id).await?;
    if user.id == auth.id {
        return Err(ApiError::bad_request("You cannot delete your own account."));
    }

    state.store.delete_user(id).await?;
    info!("Administrator '{}' deleted user '{}'", auth.username, user.username);
    Ok(NoContent::no_content())
}
