use serde::Deserialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::utils::validation::{collect, finish, require_changes};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateReviewPayload {
    pub student_id: Uuid,
    pub company_id: Uuid,
    #[validate(range(min = 1, max = 5))]
    pub rating: i32,
    #[validate(range(min = 1, max = 5))]
    pub work_environment: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub learning_opportunities: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub mentorship: Option<i32>,
    #[validate(length(max = 5000))]
    pub review_text: Option<String>,
    pub is_anonymous: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateReviewPayload {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub work_environment: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub learning_opportunities: Option<i32>,
    #[validate(range(min = 1, max = 5))]
    pub mentorship: Option<i32>,
    #[validate(length(max = 5000))]
    pub review_text: Option<String>,
    pub is_anonymous: Option<bool>,
}

impl UpdateReviewPayload {
    pub fn check(&self) -> Result<(), ValidationErrors> {
        let mut errors = collect(self);
        let empty = self.rating.is_none()
            && self.work_environment.is_none()
            && self.learning_opportunities.is_none()
            && self.mentorship.is_none()
            && self.review_text.is_none()
            && self.is_anonymous.is_none();
        require_changes(&mut errors, empty);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewListQuery {
    pub company_id: Option<Uuid>,
    pub student_id: Option<Uuid>,
    pub min_rating: Option<i32>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
