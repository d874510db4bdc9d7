use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        interview_dto::{CreateInterviewPayload, InterviewListQuery, UpdateInterviewPayload},
        transition_dto::InterviewStatusPayload,
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
pub async fn list_interviews(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<InterviewListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.interview_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_interview(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let interview = state.interview_service.get_by_id(id).await?;
    Ok(Envelope::data(interview))
}

#[axum::debug_handler]
pub async fn create_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .engine
        .schedule_interview(payload, &Actor::from(&claims))
        .await?;
    Ok((
        StatusCode::CREATED,
        Envelope::created(outcome.record.id).with_warnings(outcome.warnings),
    ))
}

#[axum::debug_handler]
pub async fn update_interview(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateInterviewPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.interview_service.update(id, payload).await?;
    Ok(Envelope::message("Interview updated"))
}

#[axum::debug_handler]
pub async fn delete_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.interview_service.delete(id).await?;
    Ok(Envelope::message("Interview deleted"))
}

#[axum::debug_handler]
pub async fn update_interview_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<InterviewStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let (transition, details) = payload.into_parts(id);
    let outcome = state
        .engine
        .transition_interview(transition, details, &Actor::from(&claims))
        .await?;
    Ok(Envelope::data(outcome.record).with_warnings(outcome.warnings))
}
