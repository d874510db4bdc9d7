use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::models::application::ApplicationStatus;
use crate::utils::validation::{collect, finish, reject_status, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    pub student_id: Uuid,
    pub job_id: Uuid,
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateApplicationPayload {
    #[validate(length(max = 5000))]
    pub cover_letter: Option<String>,
    #[validate(url)]
    pub resume_url: Option<String>,
    #[serde(default)]
    pub status: Option<serde_json::Value>,
}

impl UpdateApplicationPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        reject_status(&mut errors, self.status.is_some(), "/api/applications/{id}/status");
        require_changes(
            &mut errors,
            self.cover_letter.is_none() && self.resume_url.is_none() && self.status.is_none(),
        );
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<ApplicationStatus>,
    pub student_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
