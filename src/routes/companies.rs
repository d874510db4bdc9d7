use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;

use crate::{
    dto::{
        company_dto::{CompanyListQuery, CreateCompanyPayload, UpdateCompanyPayload},
        envelope::Envelope,
    },
    engine::Actor,
    error::Result,
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        ADMIN_ROLES,
    },
    utils::token::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn list_companies(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<CompanyListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.company_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_company(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let company = state.company_service.get_by_id(id).await?;
    Ok(Envelope::data(company))
}

#[axum::debug_handler]
pub async fn create_company(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateCompanyPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let id = state.company_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_company(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateCompanyPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.company_service.update(id, payload).await?;
    Ok(Envelope::message("Company updated"))
}

#[axum::debug_handler]
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    let closed = state
        .company_service
        .delete(id, &Actor::from(&claims))
        .await?;
    Ok(Envelope::message(format!(
        "Company deactivated, {} job(s) closed",
        closed
    )))
}

#[axum::debug_handler]
pub async fn company_dashboard(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let dashboard = state.analytics_service.company_dashboard(id).await?;
    Ok(Envelope::data(dashboard))
}
