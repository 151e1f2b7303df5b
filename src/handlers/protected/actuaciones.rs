// handlers/protected/actuaciones.rs - /api/actuaciones handlers

use axum::{extract::State, Extension};
use tracing::info;

use super::ensure_case_field;
use crate::app::AppState;
use crate::database::models::{Actuacion, ActuacionInput, ActuacionPatch, RecordFilter};
use crate::database::StoreError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, NoContent};

/// GET /api/actuaciones - List actions, optionally for one case (`?caso=`)
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RecordFilter>,
) -> ApiResult<Vec<Actuacion>> {
    Ok(ApiResponse::success(state.store.list_actuaciones(filter.caso).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(input): ApiJson<ActuacionInput>,
) -> ApiResult<Actuacion> {
    let new = input.validate(None)?;
    ensure_case_field(state.store.as_ref(), new.caso).await?;
    let actuacion = state.store.create_actuacion(new, auth.id).await?;
    info!("User '{}' added actuacion {} to case {}", auth.username, actuacion.id, actuacion.caso);
    Ok(ApiResponse::created(actuacion))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Actuacion> {
    let actuacion = state
        .store
        .actuacion_by_id(id)
        .await?
        .ok_or(StoreError::NotFound("Actuacion"))?;
    Ok(ApiResponse::success(actuacion))
}

/// PUT /api/actuaciones/:id
pub async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ActuacionInput>,
) -> ApiResult<Actuacion> {
    let new = input.validate(None)?;
    ensure_case_field(state.store.as_ref(), new.caso).await?;
    let actuacion = state.store.update_actuacion(id, ActuacionPatch::from(new)).await?;
    Ok(ApiResponse::success(actuacion))
}

/// PATCH /api/actuaciones/:id
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<ActuacionPatch>,
) -> ApiResult<Actuacion> {
    patch.validate()?;
    if let Some(caso) = patch.caso {
        ensure_case_field(state.store.as_ref(), caso).await?;
    }
    Ok(ApiResponse::success(state.store.update_actuacion(id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    state.store.delete_actuacion(id).await?;
    info!("User '{}' deleted actuacion {}", auth.username, id);
    Ok(NoContent::no_content())
}
