// handlers/protected/cases.rs - /api/cases handlers

use axum::{extract::State, Extension};
use tracing::info;

use crate::app::AppState;
use crate::database::models::{
    Actuacion, ActuacionInput, Alerta, AlertaFilter, AlertaInput, CaseDetail, CaseFilter, CaseInput,
    CasePatch, CaseSummary, LawCase, Nota, NotaInput,
};
use crate::database::{Store, StoreError};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiPath, ApiQuery, ApiResponse, ApiResult, AuthUser, NoContent};

async fn load_detail(store: &dyn Store, case: LawCase) -> Result<CaseDetail, ApiError> {
    let actuaciones = store.list_actuaciones(Some(case.id)).await?;
    let alertas = store
        .list_alertas(&AlertaFilter { caso: Some(case.id), cumplida: None })
        .await?;
    let notas = store.list_notas(Some(case.id)).await?;
    Ok(CaseDetail { case, actuaciones, alertas, notas })
}

async fn existing_case(store: &dyn Store, id: i64) -> Result<LawCase, ApiError> {
    store
        .case_by_id(id)
        .await?
        .ok_or_else(|| StoreError::NotFound("Case").into())
}

/// GET /api/cases - List cases, optionally filtered by `?search=` and `?estado=`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CaseFilter>,
) -> ApiResult<Vec<CaseSummary>> {
    let cases = state.store.list_cases(&filter).await?;
    Ok(ApiResponse::success(cases.into_iter().map(CaseSummary::from).collect()))
}

/// POST /api/cases - Create a case; its internal code is generated
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiJson(input): ApiJson<CaseInput>,
) -> ApiResult<CaseDetail> {
    input.validate()?;
    let case = state.store.create_case(input, auth.id).await?;
    info!("User '{}' created case {}", auth.username, case.codigo_interno);
    Ok(ApiResponse::created(load_detail(state.store.as_ref(), case).await?))
}

/// GET /api/cases/:id - Case with its actuaciones, alertas and notas
pub async fn get(State(state): State<AppState>, ApiPath(id): ApiPath<i64>) -> ApiResult<CaseDetail> {
    let case = existing_case(state.store.as_ref(), id).await?;
    Ok(ApiResponse::success(load_detail(state.store.as_ref(), case).await?))
}

/// PUT /api/cases/:id - Replace every writable field
pub async fn replace(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<CaseInput>,
) -> ApiResult<CaseDetail> {
    input.validate()?;
    let case = state.store.update_case(id, CasePatch::from(input), auth.id).await?;
    Ok(ApiResponse::success(load_detail(state.store.as_ref(), case).await?))
}

/// PATCH /api/cases/:id - Update only the fields present in the body
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<CasePatch>,
) -> ApiResult<CaseDetail> {
    patch.validate()?;
    let case = state.store.update_case(id, patch, auth.id).await?;
    Ok(ApiResponse::success(load_detail(state.store.as_ref(), case).await?))
}

/// DELETE /api/cases/:id - Remove a case together with its nested records
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<()> {
    state.store.delete_case(id).await?;
    info!("User '{}' deleted case {}", auth.username, id);
    Ok(NoContent::no_content())
}

/// POST /api/cases/:id/add_actuacion
pub async fn add_actuacion(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<ActuacionInput>,
) -> ApiResult<Actuacion> {
    existing_case(state.store.as_ref(), id).await?;
    let new = input.validate(Some(id))?;
    let actuacion = state.store.create_actuacion(new, auth.id).await?;
    Ok(ApiResponse::created(actuacion))
}

/// POST /api/cases/:id/add_alerta
pub async fn add_alerta(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<AlertaInput>,
) -> ApiResult<Alerta> {
    existing_case(state.store.as_ref(), id).await?;
    let new = input.validate(Some(id))?;
    let alerta = state.store.create_alerta(new, auth.id).await?;
    Ok(ApiResponse::created(alerta))
}

/// POST /api/cases/:id/add_note
pub async fn add_note(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(input): ApiJson<NotaInput>,
) -> ApiResult<Nota> {
    existing_case(state.store.as_ref(), id).await?;
    let new = input.validate(Some(id))?;
    let nota = state.store.create_nota(new, auth.id).await?;
    Ok(ApiResponse::created(nota))
}
