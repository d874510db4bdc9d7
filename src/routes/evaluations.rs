use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        evaluation_dto::{CreateEvaluationPayload, EvaluationListQuery, UpdateEvaluationPayload},
    },
    error::Result,
    routes::{
        extract::{AppJson, AppPath, AppQuery},
        ADMIN_ROLES,
    },
    utils::token::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn list_evaluations(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<EvaluationListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.evaluation_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_evaluation(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let evaluation = state.evaluation_service.get_by_id(id).await?;
    Ok(Envelope::data(evaluation))
}

#[axum::debug_handler]
pub async fn create_evaluation(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateEvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let id = state.evaluation_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_evaluation(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateEvaluationPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.evaluation_service.update(id, payload).await?;
    Ok(Envelope::message("Evaluation updated"))
}

#[axum::debug_handler]
pub async fn delete_evaluation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.evaluation_service.delete(id).await?;
    Ok(Envelope::message("Evaluation deleted"))
}
