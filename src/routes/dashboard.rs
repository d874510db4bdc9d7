use axum::{extract::State, response::IntoResponse};

use crate::{
    dto::{analytics_dto::SkillsQuery, envelope::Envelope},
    error::Result,
    routes::extract::AppQuery,
    AppState,
};

#[axum::debug_handler]
pub async fn overview(State(state): State<AppState>) -> impl IntoResponse {
    Envelope::data(state.analytics_service.overview().await)
}

#[axum::debug_handler]
pub async fn trends(State(state): State<AppState>) -> impl IntoResponse {
    Envelope::data(state.analytics_service.trends().await)
}

#[axum::debug_handler]
pub async fn geography(State(state): State<AppState>) -> impl IntoResponse {
    Envelope::data(state.analytics_service.geography().await)
}

#[axum::debug_handler]
pub async fn skills(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SkillsQuery>,
) -> Result<impl IntoResponse> {
    let skills = state.analytics_service.skills(query.limit).await?;
    Ok(Envelope::data(skills))
}
