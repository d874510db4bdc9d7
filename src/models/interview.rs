use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum InterviewStatus {
        Scheduled => "Scheduled",
        Completed => "Completed",
        Cancelled => "Cancelled" | "Canceled",
        Rescheduled => "Rescheduled",
    }
}

text_enum! {
    pub enum InterviewMode {
        Online => "Online",
        Offline => "Offline" | "In-person",
        Phone => "Phone",
        Video => "Video",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Interview {
    pub id: Uuid,
    pub application_id: Uuid,
    pub student_id: Uuid,
    pub student_name: Option<String>,
    pub job_title: Option<String>,
    #[sqlx(try_from = "String")]
    pub mode: InterviewMode,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub location: Option<String>,
    pub meeting_link: Option<String>,
    pub interviewer: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: InterviewStatus,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
