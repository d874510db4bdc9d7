use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::evaluation_dto::{
    CreateEvaluationPayload, EvaluationListQuery, UpdateEvaluationPayload,
};
use crate::error::{Error, Result};
use crate::models::evaluation::{overall_rating, Evaluation};
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

const EVALUATION_SELECT: &str = r#"
    SELECT e.id, e.assignment_id, x.student_id, e.evaluator, e.technical_skills,
           e.communication, e.teamwork, e.punctuality, e.overall_rating, e.comments,
           e.evaluated_on, e.created_at, e.updated_at
    FROM evaluations e
    JOIN intern_assignments x ON x.id = e.assignment_id
"#;

#[derive(Clone)]
pub struct EvaluationService {
    pool: PgPool,
}

impl EvaluationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: EvaluationListQuery) -> Result<Page<Evaluation>> {
        let mut filters = Predicates::new();
        filters
            .eq("e.assignment_id", query.assignment_id)
            .eq("x.student_id", query.student_id);

        fetch_page(
            &self.pool,
            EVALUATION_SELECT,
            "SELECT COUNT(*) FROM evaluations e JOIN intern_assignments x ON x.id = e.assignment_id",
            &filters,
            "e.evaluated_on DESC, e.id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Evaluation> {
        let sql = format!("{} WHERE e.id = $1", EVALUATION_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Evaluation>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Evaluation {} not found", id)))
    }

    pub async fn create(&self, payload: CreateEvaluationPayload) -> Result<Uuid> {
        let assignment: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM intern_assignments WHERE id = $1)")
                .bind(payload.assignment_id)
                .fetch_one(&self.pool)
                .await?;
        if !assignment {
            return Err(Error::PreconditionFailed(format!(
                "Assignment {} does not exist",
                payload.assignment_id
            )));
        }

        let overall = overall_rating(
            payload.technical_skills,
            payload.communication,
            payload.teamwork,
            payload.punctuality,
        );
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO evaluations (
                assignment_id, evaluator, technical_skills, communication,
                teamwork, punctuality, overall_rating, comments, evaluated_on
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, COALESCE($9, CURRENT_DATE))
            RETURNING id
            "#,
        )
        .bind(payload.assignment_id)
        .bind(payload.evaluator.trim())
        .bind(payload.technical_skills)
        .bind(payload.communication)
        .bind(payload.teamwork)
        .bind(payload.punctuality)
        .bind(overall)
        .bind(&payload.comments)
        .bind(payload.evaluated_on)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateEvaluationPayload) -> Result<()> {
        let current = self.get_by_id(id).await?;
        let overall = payload.touches_scores().then(|| {
            overall_rating(
                payload.technical_skills.unwrap_or(current.technical_skills),
                payload.communication.unwrap_or(current.communication),
                payload.teamwork.unwrap_or(current.teamwork),
                payload.punctuality.unwrap_or(current.punctuality),
            )
        });

        sqlx::query(
            r#"
            UPDATE evaluations
            SET evaluator = COALESCE($2, evaluator),
                technical_skills = COALESCE($3, technical_skills),
                communication = COALESCE($4, communication),
                teamwork = COALESCE($5, teamwork),
                punctuality = COALESCE($6, punctuality),
                overall_rating = COALESCE($7, overall_rating),
                comments = COALESCE($8, comments),
                evaluated_on = COALESCE($9, evaluated_on),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.evaluator.as_deref().map(str::trim))
        .bind(payload.technical_skills)
        .bind(payload.communication)
        .bind(payload.teamwork)
        .bind(payload.punctuality)
        .bind(overall)
        .bind(&payload.comments)
        .bind(payload.evaluated_on)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM evaluations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Evaluation {} not found", id)));
        }
        Ok(())
    }
}
