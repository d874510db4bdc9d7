use axum::{extract::State, response::IntoResponse, Extension};

use crate::{
    dto::envelope::Envelope, error::Result, routes::ADMIN_ROLES, utils::token::Claims, AppState,
};

#[axum::debug_handler]
pub async fn reconcile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    tracing::info!(requested_by = %claims.username, "student reconciliation requested");
    let repairs = state.engine.reconcile_students().await?;
    let message = format!("{} student(s) repaired", repairs.len());
    Ok(Envelope::data(repairs).with_message(message))
}
