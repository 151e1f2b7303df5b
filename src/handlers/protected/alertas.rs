// handlers/protected/alertas.rs - /api/alertas handlers

use axum::{extract::State, Extension};
use tracing::info;

use super::ensure_case_field;
use crate::app::AppState;
use crate::database::models::{Alerta, AlertaFilter, AlertaInput, AlertaPatch};
use crate::database::StoreError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, NoContent};

/// GET /api/alertas - List alerts by due date, filtered by `?caso=` and `?cumplida=`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<AlertaFilter>,
) -> ApiResult<Vec<Alerta>> {
    Ok(ApiResponse::success(state.store.list_alertas(&filter).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(input): ApiJson<AlertaInput>,
) -> ApiResult<Alerta> {
    let new = input.validate(None)?;
    ensure_case_field(state.store.as_ref(), new.caso).await?;
    let alerta = state.store.create_alerta(new, auth.id).await?;
    info!("User '{}' added alerta {} to case {}", auth.username, alerta.id, alerta.caso);
    Ok(ApiResponse::created(alerta))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Alerta> {
    let alerta = state
        .store
        .alerta_by_id(id)
        .await?
        .ok_or(StoreError::NotFound("Alerta"))?;
    Ok(ApiResponse::success(alerta))
}

pub async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<AlertaInput>,
) -> ApiResult<Alerta> {
    let new = input.validate(None)?;
    ensure_case_field(state.store.as_ref(), new.caso).await?;
    Ok(ApiResponse::success(state.store.update_alerta(id, AlertaPatch::from(new)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<AlertaPatch>,
) -> ApiResult<Alerta> {
    patch.validate()?;
    if let Some(caso) = patch.caso {
        ensure_case_field(state.store.as_ref(), caso).await?;
    }
    Ok(ApiResponse::success(state.store.update_alerta(id, patch).await?))
}

/// POST /api/alertas/:id/toggle_cumplida - Flip the fulfilled flag
pub async fn toggle_cumplida(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Alerta> {
    let alerta = state.store.toggle_alerta(id, auth.id).await?;
    info!(
        "User '{}' marked alerta {} as {}",
        auth.username,
        id,
        if alerta.cumplida { "done" } else { "pending" }
    );
    Ok(ApiResponse::success(alerta))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    state.store.delete_alerta(id).await?;
    info!("User '{}' deleted alerta {}", auth.username, id);
    Ok(NoContent::no_content())
}
