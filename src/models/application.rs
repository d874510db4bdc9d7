use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum ApplicationStatus {
        Pending => "Pending",
        UnderReview => "Under Review" | "Under_Review" | "UnderReview",
        Shortlisted => "Shortlisted",
        Selected => "Selected",
        Rejected => "Rejected",
    }
}

impl ApplicationStatus {
    /// Statuses that still block deleting the student, job or company above them.
    pub const OPEN: &'static [ApplicationStatus] = &[
        ApplicationStatus::Pending,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Shortlisted,
    ];

    /// `OPEN` as an SQL list literal.
    pub const OPEN_SQL: &'static str = "('Pending', 'Under Review', 'Shortlisted')";

    pub fn is_open(self) -> bool {
        Self::OPEN.contains(&self)
    }

    pub fn open_labels() -> Vec<&'static str> {
        Self::OPEN.iter().map(|s| s.as_str()).collect()
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub job_id: Uuid,
    pub job_title: Option<String>,
    pub company_id: Option<Uuid>,
    pub company_name: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub application_date: DateTime<Utc>,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_sql_lists_exactly_the_open_statuses() {
        let quoted: Vec<String> = ApplicationStatus::open_labels()
            .iter()
            .map(|s| format!("'{}'", s))
            .collect();
        assert_eq!(ApplicationStatus::OPEN_SQL, format!("({})", quoted.join(", ")));
        assert!(!ApplicationStatus::Selected.is_open());
        assert!(ApplicationStatus::UnderReview.is_open());
    }
}
