use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::student_dto::{
    AddStudentSkillPayload, CreateStudentPayload, StudentListQuery, UpdateStudentPayload,
    UpdateStudentSkillPayload,
};
use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use crate::models::student::{Student, StudentSkill};
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

pub(crate) const STUDENT_COLUMNS: &str = "id, first_name, last_name, email, phone, city, age, education, status, version, created_at, updated_at";

#[derive(Clone)]
pub struct StudentService {
    pool: PgPool,
}

impl StudentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: StudentListQuery) -> Result<Page<Student>> {
        let mut filters = Predicates::new();
        filters
            .eq("status", query.status.map(|s| s.as_str()))
            .contains("city", query.city.as_deref())
            .search(
                &["first_name", "last_name", "email"],
                query.search.as_deref(),
            );

        fetch_page(
            &self.pool,
            &format!("SELECT {} FROM students", STUDENT_COLUMNS),
            "SELECT COUNT(*) FROM students",
            &filters,
            "created_at DESC, id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Student> {
        let sql = format!("SELECT {} FROM students WHERE id = $1", STUDENT_COLUMNS);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Student>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Student {} not found", id)))
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<()> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM students WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            return Err(Error::Conflict(format!(
                "A student with email {} already exists",
                email
            )));
        }
        Ok(())
    }

    pub async fn create(&self, payload: CreateStudentPayload) -> Result<Uuid> {
        self.ensure_email_free(&payload.email, None).await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO students (first_name, last_name, email, phone, city, age, education)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(payload.first_name.trim())
        .bind(payload.last_name.trim())
        .bind(payload.email.trim())
        .bind(&payload.phone)
        .bind(&payload.city)
        .bind(payload.age)
        .bind(&payload.education)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateStudentPayload) -> Result<()> {
        self.get_by_id(id).await?;
        if let Some(email) = &payload.email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        sqlx::query(
            r#"
            UPDATE students
            SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                city = COALESCE($6, city),
                age = COALESCE($7, age),
                education = COALESCE($8, education),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.first_name.as_deref().map(str::trim))
        .bind(payload.last_name.as_deref().map(str::trim))
        .bind(payload.email.as_deref().map(str::trim))
        .bind(&payload.phone)
        .bind(&payload.city)
        .bind(payload.age)
        .bind(&payload.education)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Refused while the student has an open application or an active
    /// internship; finished history cascades.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM students WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("Student {} not found", id)));
        }

        let open: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM applications WHERE student_id = $1 AND status IN {}",
            ApplicationStatus::OPEN_SQL
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if open > 0 {
            return Err(Error::Conflict(format!(
                "Student has {} open application(s); reject or withdraw them first",
                open
            )));
        }

        let assigned: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM intern_assignments WHERE student_id = $1 AND status = 'Assigned'",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if assigned > 0 {
            return Err(Error::Conflict(
                "Student is currently assigned to an internship".to_string(),
            ));
        }

        sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(student_id = %id, "student deleted");
        Ok(())
    }

    pub async fn list_skills(&self, student_id: Uuid) -> Result<Vec<StudentSkill>> {
        self.get_by_id(student_id).await?;
        let skills = sqlx::query_as::<_, StudentSkill>(
            r#"
            SELECT ss.student_id, ss.skill_id, s.name AS skill_name, s.category,
                   ss.proficiency, ss.years_experience, ss.created_at
            FROM student_skills ss
            JOIN skills s ON s.id = ss.skill_id
            WHERE ss.student_id = $1
            ORDER BY s.name
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    pub async fn add_skill(&self, student_id: Uuid, payload: AddStudentSkillPayload) -> Result<()> {
        self.get_by_id(student_id).await?;

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
            "SELECT EXISTS(SELECT 1 FROM student_skills WHERE student_id = $1 AND skill_id = $2)",
        )
        .bind(student_id)
        .bind(payload.skill_id)
        .fetch_one(&self.pool)
        .await?;
        if linked {
            return Err(Error::Conflict(
                "Student already has this skill".to_string(),
            ));
        }

        sqlx::query(
            "INSERT INTO student_skills (student_id, skill_id, proficiency, years_experience) VALUES ($1, $2, $3, $4)",
        )
        .bind(student_id)
        .bind(payload.skill_id)
        .bind(payload.proficiency.as_str())
        .bind(payload.years_experience)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_skill(
        &self,
        student_id: Uuid,
        skill_id: Uuid,
        payload: UpdateStudentSkillPayload,
    ) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE student_skills
            SET proficiency = COALESCE($3, proficiency),
                years_experience = COALESCE($4, years_experience)
            WHERE student_id = $1 AND skill_id = $2
            "#,
        )
        .bind(student_id)
        .bind(skill_id)
        .bind(payload.proficiency.map(|p| p.as_str()))
        .bind(payload.years_experience)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound("Student skill not found".to_string()));
        }
        Ok(())
    }

    pub async fn remove_skill(&self, student_id: Uuid, skill_id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM student_skills WHERE student_id = $1 AND skill_id = $2")
            .bind(student_id)
            .bind(skill_id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound("Student skill not found".to_string()));
        }
        Ok(())
    }
}
