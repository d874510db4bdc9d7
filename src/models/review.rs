use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct CompanyReview {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub company_id: Uuid,
    pub company_name: Option<String>,
    pub rating: i32,
    pub work_environment: Option<i32>,
    pub learning_opportunities: Option<i32>,
    pub mentorship: Option<i32>,
    pub review_text: Option<String>,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyReview {
    /// Hides the reviewer on anonymous reviews.
    pub fn redacted(mut self) -> Self {
        if self.is_anonymous {
            self.student_name = None;
        }
        self
    }
}
