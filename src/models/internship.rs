use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum AssignmentStatus {
        Assigned => "Assigned",
        Completed => "Completed",
        Cancelled => "Cancelled" | "Canceled",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Internship {
    pub id: Uuid,
    pub company_id: Uuid,
    pub company_name: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub stipend: Option<Decimal>,
    pub slots: i32,
    pub filled: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct InternAssignment {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub internship_title: Option<String>,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: AssignmentStatus,
    pub mentor: Option<String>,
    pub assigned_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
