use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        task_dto::{CreateTaskPayload, TaskListQuery, UpdateTaskPayload},
        transition_dto::TaskStatusPayload,
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
pub async fn list_tasks(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<TaskListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.task_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let task = state.task_service.get_by_id(id).await?;
    Ok(Envelope::data(task))
}

#[axum::debug_handler]
pub async fn create_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(payload): AppJson<CreateTaskPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let outcome = state
        .engine
        .create_task(payload, &Actor::from(&claims))
        .await?;
    Ok((
        StatusCode::CREATED,
        Envelope::created(outcome.record.id).with_warnings(outcome.warnings),
    ))
}

#[axum::debug_handler]
pub async fn update_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTaskPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.task_service.update(id, payload).await?;
    Ok(Envelope::message("Task updated"))
}

#[axum::debug_handler]
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.task_service.delete(id).await?;
    Ok(Envelope::message("Task deleted"))
}

#[axum::debug_handler]
pub async fn update_task_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TaskStatusPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    let outcome = state
        .engine
        .transition_task(payload.into_transition(id), &Actor::from(&claims))
        .await?;
    Ok(Envelope::data(outcome.record).with_warnings(outcome.warnings))
}
