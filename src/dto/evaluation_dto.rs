use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::utils::validation::{collect, finish, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateEvaluationPayload {
    pub assignment_id: Uuid,
    #[validate(length(min = 1, max = 120))]
    pub evaluator: String,
    #[validate(range(min = 1, max = 5))]
    pub technical_skills: i32,
    #[validate(range(min = 1, max = 5))]
    pub communication: i32,
    #[validate(range(min = 1, max = 5))]
    pub teamwork: i32,
    #[validate(range(min = 1, max = 5))]
    pub punctuality: i32,
    pub comments: Option<String>,
    pub evaluated_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateEvaluationPayload {
    #[validate(length(min = 1, max = 120))]
    pub evaluator: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub technical_skills: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub communication: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub teamwork: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub punctuality: Option<i32>,
    pub comments: Option<String>,
    pub evaluated_on: Option<NaiveDate>,
}

impl UpdateEvaluationPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        let empty = self.evaluator.is_none()
            && self.technical_skills.is_none()
            && self.communication.is_none()
            && self.teamwork.is_none()
            && self.punctuality.is_none()
            && self.comments.is_none()
            && self.evaluated_on.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }

    pub fn touches_scores(&self) -> bool {
        self.technical_skills.is_some()
            || self.communication.is_some()
            || self.teamwork.is_some()
            || self.punctuality.is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvaluationListQuery {
    pub assignment_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
