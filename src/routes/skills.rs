use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        skill_dto::{CreateSkillPayload, SkillListQuery, UpdateSkillPayload},
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
pub async fn list_skills(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SkillListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.skill_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_skill(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let skill = state.skill_service.get_by_id(id).await?;
    Ok(Envelope::data(skill))
}

#[axum::debug_handler]
pub async fn create_skill(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateSkillPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let id = state.skill_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_skill(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateSkillPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.skill_service.update(id, payload).await?;
    Ok(Envelope::message("Skill updated"))
}

#[axum::debug_handler]
pub async fn delete_skill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.skill_service.delete(id).await?;
    Ok(Envelope::message("Skill deleted"))
}
