use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum JobStatus {
        Active => "Active",
        Inactive => "Inactive" | "Paused",
        Closed => "Closed",
    }
}

text_enum! {
    pub enum JobType {
        FullTime => "Full-time" | "Full time",
        PartTime => "Part-time" | "Part time",
        Contract => "Contract",
        Internship => "Internship",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Job {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub salary: Option<Decimal>,
    #[sqlx(try_from = "String")]
    pub job_type: JobType,
    pub location: Option<String>,
    pub positions: i32,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub posted_date: NaiveDate,
    pub deadline: NaiveDate,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct JobSkill {
    pub job_id: Uuid,
    pub skill_id: Uuid,
    pub skill_name: String,
    pub is_required: bool,
}
