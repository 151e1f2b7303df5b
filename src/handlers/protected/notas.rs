// handlers/protected/notas.rs - /api/notas handlers

use axum::{extract::State, Extension};
use tracing::info;

use super::ensure_case_field;
use crate::app::AppState;
use crate::database::models::{Nota, NotaInput, NotaPatch, RecordFilter};
use crate::database::StoreError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, NoContent};

/// GET /api/notas - Newest notes first, optionally for one case (`?caso=`)
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<RecordFilter>,
) -> ApiResult<Vec<Nota>> {
    Ok(ApiResponse::success(state.store.list_notas(filter.caso).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(input): ApiJson<NotaInput>,
) -> ApiResult<Nota> {
    let new = input.validate(None)?;
    ensure_case_field(state.store.as_ref(), new.caso).await?;
    let nota = state.store.create_nota(new, auth.id).await?;
    info!("User '{}' added nota {} to case {}", auth.username, nota.id, nota.caso);
    Ok(ApiResponse::created(nota))
}

pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<Nota> {
    let nota = state.store.nota_by_id(id).await?.ok_or(StoreError::NotFound("Nota"))?;
    Ok(ApiResponse::success(nota))
}

pub async fn replace(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<NotaInput>,
) -> ApiResult<Nota> {
    let new = input.validate(None)?;
    ensure_case_field(state.store.as_ref(), new.caso).await?;
    Ok(ApiResponse::success(state.store.update_nota(id, NotaPatch::from(new)).await?))
}

pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<NotaPatch>,
) -> ApiResult<Nota> {
    patch.validate()?;
    if let Some(caso) = patch.caso {
        ensure_case_field(state.store.as_ref(), caso).await?;
    }
    Ok(ApiResponse::success(state.store.update_nota(id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    state.store.delete_nota(id).await?;
    info!("User '{}' deleted nota {}", auth.username, id);
    Ok(NoContent::no_content())
}
