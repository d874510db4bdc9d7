use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        student_dto::{
            AddStudentSkillPayload, CreateStudentPayload, StudentListQuery, UpdateStudentPayload,
            UpdateStudentSkillPayload,
        },
        transition_dto::StudentStatusPayload,
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
pub async fn list_students(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<StudentListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.student_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_student(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let student = state.student_service.get_by_id(id).await?;
    Ok(Envelope::data(student))
}

#[axum::debug_handler]
pub async fn create_student(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateStudentPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let id = state.student_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_student(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateStudentPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.student_service.update(id, payload).await?;
    Ok(Envelope::message("Student updated"))
}

#[axum::debug_handler]
pub async fn delete_student(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.student_service.delete(id).await?;
    Ok(Envelope::message("Student deleted"))
}

#[axum::debug_handler]
pub async fn update_student_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<StudentStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let outcome = state
        .engine
        .transition_student(payload.into_transition(id), &Actor::from(&claims))
        .await?;
    Ok(Envelope::data(outcome.record).with_warnings(outcome.warnings))
}

#[axum::debug_handler]
pub async fn student_dashboard(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let dashboard = state.analytics_service.student_dashboard(id).await?;
    Ok(Envelope::data(dashboard))
}

#[axum::debug_handler]
pub async fn list_student_skills(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let skills = state.student_service.list_skills(id).await?;
    Ok(Envelope::data(skills))
}

#[axum::debug_handler]
pub async fn add_student_skill(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<AddStudentSkillPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    state.student_service.add_skill(id, payload).await?;
    Ok((StatusCode::CREATED, Envelope::message("Skill added to student")))
}

#[axum::debug_handler]
pub async fn update_student_skill(
    State(state): State<AppState>,
    AppPath((id, skill_id)): AppPath<(Uuid, Uuid)>,
    AppJson(payload): AppJson<UpdateStudentSkillPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.student_service.update_skill(id, skill_id, payload).await?;
    Ok(Envelope::message("Student skill updated"))
}

#[axum::debug_handler]
pub async fn remove_student_skill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath((id, skill_id)): AppPath<(Uuid, Uuid)>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.student_service.remove_skill(id, skill_id).await?;
    Ok(Envelope::message("Skill removed from student"))
}
