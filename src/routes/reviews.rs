use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        review_dto::{CreateReviewPayload, ReviewListQuery, UpdateReviewPayload},
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
pub async fn list_reviews(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReviewListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.review_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_review(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let review = state.review_service.get_by_id(id).await?;
    Ok(Envelope::data(review))
}

#[axum::debug_handler]
pub async fn create_review(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateReviewPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let id = state.review_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_review(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateReviewPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.review_service.update(id, payload).await?;
    Ok(Envelope::message("Review updated"))
}

#[axum::debug_handler]
pub async fn delete_review(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.review_service.delete(id).await?;
    Ok(Envelope::message("Review deleted"))
}
