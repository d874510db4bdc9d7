use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::interview::{InterviewMode, InterviewStatus};
use crate::utils::validation::{collect, finish, reject_status, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateInterviewPayload {
    pub application_id: Uuid,
    /// Must match the application's student when given.
    pub student_id: Option<Uuid>,
    pub mode: InterviewMode,
    pub scheduled_at: DateTime<Utc>,
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
    #[validate(url)]
    pub meeting_link: Option<String>,
    #[validate(length(max = 120))]
    pub interviewer: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateInterviewPayload {
    pub mode: Option<InterviewMode>,
    #[validate(range(min = 15, max = 480))]
    pub duration_minutes: Option<i32>,
    pub location: Option<String>,
    #[validate(url)]
    pub meeting_link: Option<String>,
    #[validate(length(max = 120))]
    pub interviewer: Option<String>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl UpdateInterviewPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        reject_status(&mut errors, self.status.is_some(), "/api/interviews/{id}/status");
        let empty = self.mode.is_none()
            && self.duration_minutes.is_none()
            && self.location.is_none()
            && self.meeting_link.is_none()
            && self.interviewer.is_none()
            && self.status.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InterviewListQuery {
    pub status: Option<InterviewStatus>,
    pub mode: Option<InterviewMode>,
    pub application_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
