use axum::{extract::State, http::HeaderMap, http::StatusCode, response::IntoResponse, Extension};
use validator::Validate;

use crate::{
    dto::{
        auth_dto::{LoginPayload, RegisterPayload},
        envelope::Envelope,
    },
    error::Result,
    middleware::auth::bearer_claims,
    routes::extract::AppJson,
    utils::token::Claims,
    AppState,
};

/// Open route: the first admin bootstraps without a token, later ones need
/// a super_admin bearer.
#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    AppJson(payload): AppJson<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let caller = bearer_claims(&headers, &state.config.jwt_secret)?;
    let admin = state.auth_service.register(payload, caller.as_ref()).await?;
    Ok((
        StatusCode::CREATED,
        Envelope::data(admin).with_message("Admin registered"),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let session = state.auth_service.login(payload).await?;
    Ok(Envelope::data(session))
}

#[axum::debug_handler]
pub async fn profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let admin = state.auth_service.profile(claims.sub).await?;
    Ok(Envelope::data(admin))
}
