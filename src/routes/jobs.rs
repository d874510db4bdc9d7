use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        job_dto::{AddJobSkillPayload, CreateJobPayload, JobListQuery, UpdateJobPayload},
        transition_dto::JobStatusPayload,
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
pub async fn list_jobs(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<JobListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.job_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_job(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let job = state.job_service.get_by_id(id).await?;
    Ok(Envelope::data(job))
}

#[axum::debug_handler]
pub async fn create_job(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let id = state.job_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_job(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateJobPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.job_service.update(id, payload).await?;
    Ok(Envelope::message("Job updated"))
}

#[axum::debug_handler]
pub async fn delete_job(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.job_service.delete(id).await?;
    Ok(Envelope::message("Job deleted"))
}

#[axum::debug_handler]
pub async fn update_job_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<JobStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let outcome = state
        .engine
        .transition_job(payload.into_transition(id), &Actor::from(&claims))
        .await?;
    Ok(Envelope::data(outcome.record).with_warnings(outcome.warnings))
}

#[axum::debug_handler]
pub async fn job_summary(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let summary = state.analytics_service.job_summary(id).await?;
    Ok(Envelope::data(summary))
}

#[axum::debug_handler]
pub async fn list_job_skills(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let skills = state.job_service.list_skills(id).await?;
    Ok(Envelope::data(skills))
}

#[axum::debug_handler]
pub async fn add_job_skill(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AddJobSkillPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.job_service.add_skill(id, payload).await?;
    Ok((StatusCode::CREATED, Envelope::message("Skill added to job")))
}

#[axum::debug_handler]
pub async fn remove_job_skill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath((id, skill_id)): AppPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.job_service.remove_skill(id, skill_id).await?;
    Ok(Envelope::message("Skill removed from job"))
}
