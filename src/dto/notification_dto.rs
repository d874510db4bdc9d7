use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::notification::NotificationType;
use crate::utils::validation::{collect, finish, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateNotificationPayload {
    pub student_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
    pub notification_type: Option<NotificationType>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateNotificationPayload {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000))]
    pub message: Option<String>,
    pub notification_type: Option<NotificationType>,
    pub is_read: Option<bool>,
}

impl UpdateNotificationPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        let empty = self.title.is_none()
            && self.message.is_none()
            && self.notification_type.is_none()
            && self.is_read.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationListQuery {
    pub student_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub is_read: Option<bool>,
    pub notification_type: Option<NotificationType>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReadAllQuery {
    pub student_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
}
