use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::interview_dto::{InterviewListQuery, UpdateInterviewPayload};
use crate::error::{Error, Result};
use crate::models::interview::Interview;
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

pub(crate) const INTERVIEW_SELECT: &str = r#"
    SELECT i.id, i.application_id, i.student_id,
           s.first_name || ' ' || s.last_name AS student_name, j.title AS job_title,
           i.mode, i.scheduled_at, i.duration_minutes, i.location, i.meeting_link,
           i.interviewer, i.status, i.score, i.feedback, i.version, i.created_at, i.updated_at
    FROM interviews i
    JOIN students s ON s.id = i.student_id
    JOIN applications a ON a.id = i.application_id
    JOIN jobs j ON j.id = a.job_id
"#;

#[derive(Clone)]
pub struct InterviewService {
    pool: PgPool,
}

impl InterviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: InterviewListQuery) -> Result<Page<Interview>> {
        let mut filters = Predicates::new();
        filters
            .eq("i.status", query.status.map(|s| s.as_str()))
            .eq("i.mode", query.mode.map(|m| m.as_str()))
            .eq("i.application_id", query.application_id)
            .eq("i.student_id", query.student_id)
            .at_least("i.scheduled_at", query.from)
            .at_most("i.scheduled_at", query.to);

        fetch_page(
            &self.pool,
            INTERVIEW_SELECT,
            "SELECT COUNT(*) FROM interviews i",
            &filters,
            "i.scheduled_at, i.id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Interview> {
        let sql = format!("{} WHERE i.id = $1", INTERVIEW_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Interview>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Interview {} not found", id)))
    }

    pub async fn update(&self, id: Uuid, payload: UpdateInterviewPayload) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE interviews
            SET mode = COALESCE($2, mode),
                duration_minutes = COALESCE($3, duration_minutes),
                location = COALESCE($4, location),
                meeting_link = COALESCE($5, meeting_link),
                interviewer = COALESCE($6, interviewer),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.mode.map(|m| m.as_str()))
        .bind(payload.duration_minutes)
        .bind(&payload.location)
        .bind(&payload.meeting_link)
        .bind(&payload.interviewer)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Interview {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM interviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Interview {} not found", id)));
        }
        Ok(())
    }
}
