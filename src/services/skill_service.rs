use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::skill_dto::{CreateSkillPayload, SkillListQuery, UpdateSkillPayload};
use crate::error::{Error, Result};
use crate::models::skill::Skill;
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

const SKILL_COLUMNS: &str = "id, name, category, description, created_at, updated_at";

#[derive(Clone)]
pub struct SkillService {
    pool: PgPool,
}

impl SkillService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: SkillListQuery) -> Result<Page<Skill>> {
        let mut filters = Predicates::new();
        filters
            .eq("category", query.category.map(|c| c.as_str()))
            .search(&["name"], query.search.as_deref());

        fetch_page(
            &self.pool,
            &format!("SELECT {} FROM skills", SKILL_COLUMNS),
            "SELECT COUNT(*) FROM skills",
            &filters,
            "name, id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Skill> {
        let sql = format!("SELECT {} FROM skills WHERE id = $1", SKILL_COLUMNS);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Skill>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Skill {} not found", id)))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<()> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM skills WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name.trim())
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            return Err(Error::Conflict(format!("Skill {} already exists", name.trim())));
        }
        Ok(())
    }

    pub async fn create(&self, payload: CreateSkillPayload) -> Result<Uuid> {
        self.ensure_name_free(&payload.name, None).await?;
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO skills (name, category, description) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(payload.name.trim())
        .bind(payload.category.as_str())
        .bind(&payload.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateSkillPayload) -> Result<()> {
        self.get_by_id(id).await?;
        if let Some(name) = &payload.name {
            self.ensure_name_free(name, Some(id)).await?;
        }
        sqlx::query(
            r#"
            UPDATE skills
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                description = COALESCE($4, description),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(payload.category.map(|c| c.as_str()))
        .bind(&payload.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let done = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if done.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Skill {} not found", id)));
        }
        Ok(())
    }
}
