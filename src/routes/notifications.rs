use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        envelope::Envelope,
        notification_dto::{
            CreateNotificationPayload, NotificationListQuery, ReadAllQuery,
            UpdateNotificationPayload,
        },
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
pub async fn list_notifications(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<NotificationListQuery>,
) -> Result<impl IntoResponse> {
    let page = state.notification_service.list(query).await?;
    Ok(Envelope::page(page))
}

#[axum::debug_handler]
pub async fn get_notification(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    let notification = state.notification_service.get_by_id(id).await?;
    Ok(Envelope::data(notification))
}

#[axum::debug_handler]
pub async fn create_notification(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreateNotificationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let id = state.notification_service.create(payload).await?;
    Ok((StatusCode::CREATED, Envelope::created(id)))
}

#[axum::debug_handler]
pub async fn update_notification(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateNotificationPayload>,
) -> Result<impl IntoResponse> {
    payload.check()?;
    state.notification_service.update(id, payload).await?;
    Ok(Envelope::message("Notification updated"))
}

#[axum::debug_handler]
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    claims.require_any(ADMIN_ROLES)?;
    state.notification_service.delete(id).await?;
    Ok(Envelope::message("Notification deleted"))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<impl IntoResponse> {
    state.notification_service.mark_read(id).await?;
    Ok(Envelope::message("Notification marked as read"))
}

#[axum::debug_handler]
pub async fn mark_all_notifications_read(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReadAllQuery>,
) -> Result<impl IntoResponse> {
    let updated = state.notification_service.mark_all_read(query).await?;
    Ok(Envelope::message(format!(
        "{} notification(s) marked as read",
        updated
    )))
}
