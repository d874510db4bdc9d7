use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::internship_dto::{
    AssignmentListQuery, CreateInternshipPayload, InternshipListQuery, UpdateAssignmentPayload,
    UpdateInternshipPayload,
};
use crate::error::{Error, Result};
use crate::models::internship::{InternAssignment, Internship};
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

pub(crate) const INTERNSHIP_SELECT: &str = r#"
    SELECT n.id, n.company_id, c.name AS company_name, n.title, n.description,
           n.start_date, n.end_date, n.stipend, n.slots,
           (SELECT COUNT(*) FROM intern_assignments x
             WHERE x.internship_id = n.id AND x.status = 'Assigned') AS filled,
           n.is_active, n.created_at, n.updated_at
    FROM internships n
    JOIN companies c ON c.id = n.company_id
"#;

pub(crate) const ASSIGNMENT_SELECT: &str = r#"
    SELECT x.id, x.internship_id, n.title AS internship_title, x.student_id,
           s.first_name || ' ' || s.last_name AS student_name, x.status, x.mentor,
           x.assigned_at, x.ended_at, x.version, x.created_at, x.updated_at
    FROM intern_assignments x
    JOIN internships n ON n.id = x.internship_id
    JOIN students s ON s.id = x.student_id
"#;

#[derive(Clone)]
pub struct InternshipService {
    pool: PgPool,
}

impl InternshipService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: InternshipListQuery) -> Result<Page<Internship>> {
        let mut filters = Predicates::new();
        filters
            .eq("n.company_id", query.company_id)
            .eq("n.is_active", query.is_active)
            .search(&["n.title"], query.search.as_deref());

        fetch_page(
            &self.pool,
            INTERNSHIP_SELECT,
            "SELECT COUNT(*) FROM internships n",
            &filters,
            "n.start_date DESC, n.id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Internship> {
        let sql = format!("{} WHERE n.id = $1", INTERNSHIP_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Internship>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Internship {} not found", id)))
    }

    pub async fn create(&self, payload: CreateInternshipPayload) -> Result<Uuid> {
        let company: Option<bool> = sqlx::query_scalar("SELECT is_active FROM companies WHERE id = $1")
            .bind(payload.company_id)
            .fetch_optional(&self.pool)
            .await?;
        if company != Some(true) {
            return Err(Error::PreconditionFailed(format!(
                "Company {} does not exist or is inactive",
                payload.company_id
            )));
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO internships (company_id, title, description, start_date, end_date, stipend, slots)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(payload.company_id)
        .bind(payload.title.trim())
        .bind(&payload.description)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.stipend)
        .bind(payload.slots.unwrap_or(1))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateInternshipPayload) -> Result<()> {
        let current = self.get_by_id(id).await?;
        payload.check_against(current.start_date, current.end_date)?;
        if let Some(slots) = payload.slots {
            if i64::from(slots) < current.filled {
                return Err(Error::Conflict(format!(
                    "Internship already has {} active intern(s)",
                    current.filled
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE internships
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                start_date = COALESCE($4, start_date),
                end_date = COALESCE($5, end_date),
                stipend = COALESCE($6, stipend),
                slots = COALESCE($7, slots),
                is_active = COALESCE($8, is_active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.title.as_deref().map(str::trim))
        .bind(&payload.description)
        .bind(payload.start_date)
        .bind(payload.end_date)
        .bind(payload.stipend)
        .bind(payload.slots)
        .bind(payload.is_active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Refused while anyone is still assigned.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM internships WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            return Err(Error::NotFound(format!("Internship {} not found", id)));
        }
        let assigned: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM intern_assignments WHERE internship_id = $1 AND status = 'Assigned'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if assigned > 0 {
            return Err(Error::Conflict(format!(
                "Internship has {} active intern(s)",
                assigned
            )));
        }
        sqlx::query("DELETE FROM internships WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(internship_id = %id, "internship deleted");
        Ok(())
    }

    pub async fn list_assignments(&self, query: AssignmentListQuery) -> Result<Page<InternAssignment>> {
        let mut filters = Predicates::new();
        filters
            .eq("x.internship_id", query.internship_id)
            .eq("x.student_id", query.student_id)
            .eq("x.status", query.status.map(|s| s.as_str()));

        fetch_page(
            &self.pool,
            ASSIGNMENT_SELECT,
            "SELECT COUNT(*) FROM intern_assignments x",
            &filters,
            "x.assigned_at DESC, x.id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_assignment(&self, id: Uuid) -> Result<InternAssignment> {
        let sql = format!("{} WHERE x.id = $1", ASSIGNMENT_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, InternAssignment>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Assignment {} not found", id)))
    }

    pub async fn update_assignment(&self, id: Uuid, payload: UpdateAssignmentPayload) -> Result<()> {
        let done = sqlx::query(
            "UPDATE intern_assignments SET mentor = COALESCE($2, mentor), updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&payload.mentor)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Assignment {} not found", id)));
        }
        Ok(())
    }
}
