use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::notification_dto::{
    CreateNotificationPayload, NotificationListQuery, ReadAllQuery, UpdateNotificationPayload,
};
use crate::error::{Error, Result};
use crate::models::notification::{Notification, NotificationType};
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

const NOTIFICATION_COLUMNS: &str = "id, student_id, admin_id, title, message, notification_type, is_read, read_at, created_at";

#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
}

impl NotificationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: NotificationListQuery) -> Result<Page<Notification>> {
        let mut filters = Predicates::new();
        filters
            .eq("student_id", query.student_id)
            .eq("admin_id", query.admin_id)
            .eq("is_read", query.is_read)
            .eq("notification_type", query.notification_type.map(|t| t.as_str()));

        fetch_page(
            &self.pool,
            &format!("SELECT {} FROM notifications", NOTIFICATION_COLUMNS),
            "SELECT COUNT(*) FROM notifications",
            &filters,
            "created_at DESC, id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Notification> {
        let sql = format!("SELECT {} FROM notifications WHERE id = $1", NOTIFICATION_COLUMNS);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Notification>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Notification {} not found", id)))
    }

    async fn ensure_recipients(&self, student_id: Option<Uuid>, admin_id: Option<Uuid>) -> Result<()> {
        if let Some(id) = student_id {
            let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            if !found {
                return Err(Error::PreconditionFailed(format!("Student {} does not exist", id)));
            }
        }
        if let Some(id) = admin_id {
            let found: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            if !found {
                return Err(Error::PreconditionFailed(format!("Admin {} does not exist", id)));
            }
        }
        Ok(())
    }

    pub async fn create(&self, payload: CreateNotificationPayload) -> Result<Uuid> {
        self.ensure_recipients(payload.student_id, payload.admin_id).await?;
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (student_id, admin_id, title, message, notification_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(payload.student_id)
        .bind(payload.admin_id)
        .bind(&payload.title)
        .bind(&payload.message)
        .bind(payload.notification_type.unwrap_or(NotificationType::Info).as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateNotificationPayload) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE notifications
            SET title = COALESCE($2, title),
                message = COALESCE($3, message),
                notification_type = COALESCE($4, notification_type),
                read_at = CASE
                    WHEN $5::boolean IS NULL THEN read_at
                    WHEN $5 THEN COALESCE(read_at, NOW())
                    ELSE NULL
                END,
                is_read = COALESCE($5, is_read)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&payload.title)
        .bind(&payload.message)
        .bind(payload.notification_type.map(|t| t.as_str()))
        .bind(payload.is_read)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Notification {} not found", id)));
        }
        Ok(())
    }

    pub async fn mark_read(&self, id: Uuid) -> Result<()> {
        let pool = &self.pool;
        let done = retry::write(|| async move {
            sqlx::query(
                "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()) WHERE id = $1",
            )
            .bind(id)
            .execute(pool)
            .await
        })
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Notification {} not found", id)));
        }
        Ok(())
    }

    /// Marks every unread notification for one recipient; returns the count.
    pub async fn mark_all_read(&self, query: ReadAllQuery) -> Result<u64> {
        if query.student_id.is_none() && query.admin_id.is_none() {
            return Err(Error::BadRequest(
                "student_id or admin_id is required".to_string(),
            ));
        }
        let pool = &self.pool;
        let (student_id, admin_id) = (query.student_id, query.admin_id);
        let done = retry::write(|| async move {
            sqlx::query(
                r#"
                UPDATE notifications
                SET is_read = TRUE, read_at = NOW()
                WHERE NOT is_read
                  AND ($1::uuid IS NULL OR student_id = $1)
                  AND ($2::uuid IS NULL OR admin_id = $2)
                "#,
            )
            .bind(student_id)
            .bind(admin_id)
            .execute(pool)
            .await
        })
        .await?;
        Ok(done.rows_affected())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Notification {} not found", id)));
        }
        Ok(())
    }
}
