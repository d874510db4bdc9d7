use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::application_dto::{ApplicationListQuery, UpdateApplicationPayload};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

pub(crate) const APPLICATION_SELECT: &str = r#"
    SELECT a.id, a.student_id, s.first_name || ' ' || s.last_name AS student_name,
           a.job_id, j.title AS job_title, j.company_id, c.name AS company_name,
           a.status, a.application_date, a.cover_letter, a.resume_url,
           a.version, a.created_at, a.updated_at
    FROM applications a
    JOIN students s ON s.id = a.student_id
    JOIN jobs j ON j.id = a.job_id
    JOIN companies c ON c.id = j.company_id
"#;

const APPLICATION_COUNT: &str = r#"
    SELECT COUNT(*)
    FROM applications a
    JOIN students s ON s.id = a.student_id
    JOIN jobs j ON j.id = a.job_id
    JOIN companies c ON c.id = j.company_id
"#;

/// Shared by the list endpoint and the XLSX report.
pub(crate) fn application_filters(query: &ApplicationListQuery) -> Predicates {
    let mut filters = Predicates::new();
    filters
        .eq("a.status", query.status.map(|s| s.as_str()))
        .eq("a.student_id", query.student_id)
        .eq("a.job_id", query.job_id)
        .eq("j.company_id", query.company_id);
    filters
}

#[derive(Clone)]
pub struct ApplicationService {
    pool: PgPool,
}

impl ApplicationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: ApplicationListQuery) -> Result<Page<Application>> {
        let filters = application_filters(&query);
        fetch_page(
            &self.pool,
            APPLICATION_SELECT,
            APPLICATION_COUNT,
            &filters,
            "a.application_date DESC, a.id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    /// Unpaginated, for reports.
    pub async fn list_all(&self, query: &ApplicationListQuery) -> Result<Vec<Application>> {
        let filters = application_filters(query);
        let sql = format!(
            "{} {} ORDER BY a.application_date DESC, a.id",
            APPLICATION_SELECT,
            filters.where_clause()
        );
        let rows = filters
            .bind_as(sqlx::query_as::<_, Application>(&sql))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Application> {
        let sql = format!("{} WHERE a.id = $1", APPLICATION_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Application>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Application {} not found", id)))
    }

    pub async fn update(&self, id: Uuid, payload: UpdateApplicationPayload) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE applications
            SET cover_letter = COALESCE($2, cover_letter),
                resume_url = COALESCE($3, resume_url),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&payload.cover_letter)
        .bind(&payload.resume_url)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Application {} not found", id)));
        }
        Ok(())
    }
}
