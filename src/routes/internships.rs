use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        internship_dto::{
            AssignStudentPayload, AssignmentListQuery, CreateInternshipPayload,
            InternshipListQuery, UpdateAssignmentPayload, UpdateInternshipPayload,
        },
        transition_dto::AssignmentStatusPayload,
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
pub async fn list_internships(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<InternshipListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.internship_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_internship(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let internship = state.internship_service.get_by_id(id).await?;
    Ok(Envelope::data(internship))
}

#[axum::debug_handler]
pub async fn create_internship(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateInternshipPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let id = state.internship_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_internship(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateInternshipPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.internship_service.update(id, payload).await?;
    Ok(Envelope::message("Internship updated"))
}

#[axum::debug_handler]
pub async fn delete_internship(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.internship_service.delete(id).await?;
    Ok(Envelope::message("Internship deleted"))
}

#[axum::debug_handler]
pub async fn assign_student(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AssignStudentPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .engine
        .assign_student(id, payload, &Actor::from(&claims))
        .await?;
    Ok((
        StatusCode::CREATED,
        Envelope::created(outcome.record.id).with_warnings(outcome.warnings),
    ))
}

#[axum::debug_handler]
pub async fn list_assignments(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<AssignmentListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.internship_service.list_assignments(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_assignment(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let assignment = state.internship_service.get_assignment(id).await?;
    Ok(Envelope::data(assignment))
}

#[axum::debug_handler]
pub async fn update_assignment(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateAssignmentPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.internship_service.update_assignment(id, payload).await?;
    Ok(Envelope::message("Assignment updated"))
}

#[axum::debug_handler]
pub async fn update_assignment_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AssignmentStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let outcome = state
        .engine
        .transition_assignment(payload.into_transition(id), &Actor::from(&claims))
        .await?;
    Ok(Envelope::data(outcome.record).with_warnings(outcome.warnings))
}
