use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{
            ApplicationListQuery, CreateApplicationPayload, UpdateApplicationPayload,
        },
        envelope::Envelope,
        transition_dto::ApplicationStatusPayload,
    },
    engine::{Actor, EntityKind},
    error::Result,
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        ADMIN_ROLES,
    },
    utils::token::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn list_applications(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ApplicationListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.application_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_application(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let application = state.application_service.get_by_id(id).await?;
    Ok(Envelope::data(application))
}

#[axum::debug_handler]
pub async fn create_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .engine
        .submit_application(payload, &Actor::from(&claims))
        .await?;
    Ok((
        StatusCode::CREATED,
        Envelope::created(outcome.record.id).with_warnings(outcome.warnings),
    ))
}

#[axum::debug_handler]
pub async fn update_application(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.application_service.update(id, payload).await?;
    Ok(Envelope::message("Application updated"))
}

/// Withdrawal: the row and its interviews go, the student is released.
#[axum::debug_handler]
pub async fn delete_application(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    let outcome = state
        .engine
        .withdraw_application(id, &Actor::from(&claims))
        .await?;
    Ok(Envelope::message("Application withdrawn").with_warnings(outcome.warnings))
}

#[axum::debug_handler]
pub async fn update_application_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<ApplicationStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let outcome = state
        .engine
        .transition_application(payload.into_transition(id), &Actor::from(&claims))
        .await?;
    Ok(Envelope::data(outcome.record).with_warnings(outcome.warnings))
}

#[axum::debug_handler]
pub async fn application_history(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.application_service.get_by_id(id).await?;
    let history = state
        .history_service
        .for_entity(EntityKind::Application, id)
        .await?;
    Ok(Envelope::data(history))
}
