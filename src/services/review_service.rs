use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::review_dto::{CreateReviewPayload, ReviewListQuery, UpdateReviewPayload};
use crate::error::{Error, Result};
use crate::models::review::CompanyReview;
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.student_id, s.first_name || ' ' || s.last_name AS student_name,
           r.company_id, c.name AS company_name, r.rating, r.work_environment,
           r.learning_opportunities, r.mentorship, r.review_text, r.is_anonymous,
           r.created_at, r.updated_at
    FROM company_reviews r
    JOIN students s ON s.id = r.student_id
    JOIN companies c ON c.id = r.company_id
"#;

#[derive(Clone)]
pub struct ReviewService {
    pool: PgPool,
}

impl ReviewService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: ReviewListQuery) -> Result<Page<CompanyReview>> {
        let mut filters = Predicates::new();
        filters
            .eq("r.company_id", query.company_id)
            .eq("r.student_id", query.student_id)
            .at_least("r.rating", query.min_rating);

        let page = fetch_page(
            &self.pool,
            REVIEW_SELECT,
            "SELECT COUNT(*) FROM company_reviews r",
            &filters,
            "r.created_at DESC, r.id",
            PageRequest::new(query.page, query.limit),
        )
        .await?;
        Ok(page.map(CompanyReview::redacted))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<CompanyReview> {
        let sql = format!("{} WHERE r.id = $1", REVIEW_SELECT);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, CompanyReview>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .map(CompanyReview::redacted)
        .ok_or_else(|| Error::NotFound(format!("Review {} not found", id)))
    }

    pub async fn create(&self, payload: CreateReviewPayload) -> Result<Uuid> {
        let student: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE id = $1)")
            .bind(payload.student_id)
            .fetch_one(&self.pool)
            .await?;
        if !student {
            return Err(Error::PreconditionFailed(format!(
                "Student {} does not exist",
                payload.student_id
            )));
        }
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

        let reviewed: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM company_reviews WHERE student_id = $1 AND company_id = $2)",
        )
        .bind(payload.student_id)
        .bind(payload.company_id)
        .fetch_one(&self.pool)
        .await?;
        if reviewed {
            return Err(Error::Conflict(
                "Student has already reviewed this company".to_string(),
            ));
        }

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO company_reviews (
                student_id, company_id, rating, work_environment,
                learning_opportunities, mentorship, review_text, is_anonymous
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(payload.student_id)
        .bind(payload.company_id)
        .bind(payload.rating)
        .bind(payload.work_environment)
        .bind(payload.learning_opportunities)
        .bind(payload.mentorship)
        .bind(&payload.review_text)
        .bind(payload.is_anonymous.unwrap_or(false))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateReviewPayload) -> Result<()> {
        let done = sqlx::query(
            r#"
            UPDATE company_reviews
            SET rating = COALESCE($2, rating),
                work_environment = COALESCE($3, work_environment),
                learning_opportunities = COALESCE($4, learning_opportunities),
                mentorship = COALESCE($5, mentorship),
                review_text = COALESCE($6, review_text),
                is_anonymous = COALESCE($7, is_anonymous),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.rating)
        .bind(payload.work_environment)
        .bind(payload.learning_opportunities)
        .bind(payload.mentorship)
        .bind(&payload.review_text)
        .bind(payload.is_anonymous)
        .execute(&self.pool)
        .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Review {} not found", id)));
        }
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM company_reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Review {} not found", id)));
        }
        Ok(())
    }
}
