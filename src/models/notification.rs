use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

text_enum! {
    pub enum NotificationType {
        Info => "info",
        Warning => "warning",
        Success => "success",
        Error => "error",
        Reminder => "reminder",
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub student_id: Option<Uuid>,
    pub admin_id: Option<Uuid>,
    pub title: String,
    pub message: String,
    #[sqlx(try_from = "String")]
    pub notification_type: NotificationType,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_text_converts_for_every_type() {
        for kind in NotificationType::ALL {
            let back = NotificationType::try_from(kind.as_str().to_string()).unwrap();
            assert_eq!(back, *kind);
        }
        assert_eq!(
            NotificationType::try_from("ERROR".to_string()).unwrap(),
            NotificationType::Error
        );
        let err = NotificationType::try_from("urgent".to_string()).unwrap_err();
        assert!(err.to_string().contains("urgent"));
    }
}
