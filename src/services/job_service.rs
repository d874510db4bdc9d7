use sqlx::PgPool;
use uuid::Uuid;
use validator::ValidationErrors;

use crate::database::retry;
use crate::dto::job_dto::{
    check_deadline, AddJobSkillPayload, CreateJobPayload, JobListQuery, UpdateJobPayload,
};
use crate::engine::lock_student;
use crate::engine::reconcile::settle_student;
use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use crate::models::job::{Job, JobSkill};
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};
use crate::utils::validation::finish;

pub(crate) const JOB_SELECT: &str = r#"
    SELECT j.id, j.company_id, c.name AS company_name, j.title, j.description, j.requirements,
           j.salary, j.job_type, j.location, j.positions, j.status, j.posted_date, j.deadline,
           j.version, j.created_at, j.updated_at
    FROM jobs j
    JOIN companies c ON c.id = j.company_id
"#;

#[derive(Clone)]
pub struct JobService {
    pool: PgPool,
}

impl JobService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: JobListQuery) -> Result<Page<Job>> {
        let mut filters = Predicates::new();
        filters
            .eq("j.status", query.status.map(|s| s.as_str()))
            .eq("j.company_id", query.company_id)
            .eq("j.job_type", query.job_type.map(|t| t.as_str()))
            .contains("j.location", query.location.as_deref())
            .search(&["j.title"], query.search.as_deref());

        fetch_page(
            &self.pool,
            JOB_SELECT,
            "SELECT COUNT(*) FROM jobs j JOIN companies c ON c.id = j.company_id",
            &filters,
            "j.posted_date DESC, j.created_at DESC, j.id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Job> {
        let sql = format!("{} WHERE j.id = $1", JOB_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Job>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Job {} not found", id)))
    }

    pub async fn create(&self, payload: CreateJobPayload) -> Result<Uuid> {
        let company_active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM companies WHERE id = $1")
                .bind(payload.company_id)
                .fetch_optional(&self.pool)
                .await?;
        match company_active {
            None => {
                return Err(Error::PreconditionFailed(format!(
                    "Company {} does not exist",
                    payload.company_id
                )))
            }
            Some(false) => {
                return Err(Error::PreconditionFailed(
                    "Company is inactive and cannot post jobs".to_string(),
                ))
            }
            Some(true) => {}
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO jobs (
                company_id, title, description, requirements, salary,
                job_type, location, positions, posted_date, deadline
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(payload.company_id)
        .bind(payload.title.trim())
        .bind(&payload.description)
        .bind(&payload.requirements)
        .bind(payload.salary)
        .bind(payload.job_type.as_str())
        .bind(&payload.location)
        .bind(payload.positions.unwrap_or(1))
        .bind(payload.effective_posted_date())
        .bind(payload.deadline)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateJobPayload) -> Result<()> {
        let current = self.get_by_id(id).await?;
        if payload.posted_date.is_some() || payload.deadline.is_some() {
            let mut errors = ValidationErrors::new();
            check_deadline(
                &mut errors,
                payload.posted_date.unwrap_or(current.posted_date),
                payload.deadline.unwrap_or(current.deadline),
            );
            finish(errors)?;
        }

        sqlx::query(
            r#"
            UPDATE jobs
            SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                requirements = COALESCE($4, requirements),
                salary = COALESCE($5, salary),
                job_type = COALESCE($6, job_type),
                location = COALESCE($7, location),
                positions = COALESCE($8, positions),
                posted_date = COALESCE($9, posted_date),
                deadline = COALESCE($10, deadline),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.title.as_deref().map(str::trim))
        .bind(&payload.description)
        .bind(&payload.requirements)
        .bind(payload.salary)
        .bind(payload.job_type.map(|t| t.as_str()))
        .bind(&payload.location)
        .bind(payload.positions)
        .bind(payload.posted_date)
        .bind(payload.deadline)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Hard delete. Refused while the job has an open application; the
    /// closed ones cascade and their students are settled in the same
    /// transaction, students locked before the job.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let student_ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT student_id FROM applications WHERE job_id = $1 ORDER BY student_id",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        let mut students = Vec::with_capacity(student_ids.len());
        for student_id in student_ids {
            if let Some(student) = lock_student(&mut tx, student_id).await? {
                students.push(student);
            }
        }

        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM jobs WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if found.is_none() {
            return Err(Error::NotFound(format!("Job {} not found", id)));
        }

        // anything submitted since the student read is still open
        let open: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM applications WHERE job_id = $1 AND status IN {}",
            ApplicationStatus::OPEN_SQL
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if open > 0 {
            return Err(Error::Conflict(format!(
                "Job has {} open application(s)",
                open
            )));
        }

        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        for student in students.iter_mut() {
            settle_student(&mut tx, student, "job deleted").await?;
        }
        tx.commit().await?;

        tracing::info!(job_id = %id, students = students.len(), "job deleted");
        Ok(())
    }

    pub async fn list_skills(&self, job_id: Uuid) -> Result<Vec<JobSkill>> {
        self.get_by_id(job_id).await?;
        let skills = sqlx::query_as::<_, JobSkill>(
            r#"
            SELECT js.job_id, js.skill_id, s.name AS skill_name, js.is_required
            FROM job_skills js
            JOIN skills s ON s.id = js.skill_id
            WHERE js.job_id = $1
            ORDER BY js.is_required DESC, s.name
            "#,
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    pub async fn add_skill(&self, job_id: Uuid, payload: AddJobSkillPayload) -> Result<()> {
        self.get_by_id(job_id).await?;

        let skill_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM skills WHERE id = $1)")
                .bind(payload.skill_id)
                .fetch_one(&self.pool)
                .await?;
        if !skill_exists {
            return Err(Error::PreconditionFailed(format!(
                "Skill {} does not exist",
                payload.skill_id
            )));
        }

        let linked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM job_skills WHERE job_id = $1 AND skill_id = $2)",
        )
        .bind(job_id)
        .bind(payload.skill_id)
        .fetch_one(&self.pool)
        .await?;
        if linked {
            return Err(Error::Conflict("Job already lists this skill".to_string()));
        }

        sqlx::query("INSERT INTO job_skills (job_id, skill_id, is_required) VALUES ($1, $2, $3)")
            .bind(job_id)
            .bind(payload.skill_id)
            .bind(payload.is_required.unwrap_or(true))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn remove_skill(&self, job_id: Uuid, skill_id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM job_skills WHERE job_id = $1 AND skill_id = $2")
            .bind(job_id)
            .bind(skill_id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound("Job skill not found".to_string()));
        }
        Ok(())
    }
}
