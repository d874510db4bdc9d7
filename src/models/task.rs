use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum TaskStatus {
        Pending => "Pending",
        InProgress => "In Progress" | "In_Progress" | "InProgress",
        Completed => "Completed",
        Cancelled => "Cancelled" | "Canceled",
    }
}

text_enum! {
    pub enum TaskPriority {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    #[sqlx(try_from = "String")]
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
