use sqlx::PgPool;
use uuid::Uuid;

use crate::database::retry;
use crate::dto::company_dto::{CompanyListQuery, CreateCompanyPayload, UpdateCompanyPayload};
use crate::engine::{self, Actor};
use crate::error::{Error, Result};
use crate::models::application::ApplicationStatus;
use crate::models::company::Company;
use crate::services::listing::{fetch_page, Page, PageRequest, Predicates};

const COMPANY_COLUMNS: &str = "id, name, industry, city, address, website, contact_person, contact_email, contact_phone, description, is_active, created_at, updated_at";

#[derive(Clone)]
pub struct CompanyService {
    pool: PgPool,
}

impl CompanyService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: CompanyListQuery) -> Result<Page<Company>> {
        let mut filters = Predicates::new();
        filters
            .eq("is_active", Some(query.is_active.unwrap_or(true)))
            .eq("industry", query.industry)
            .contains("city", query.city.as_deref())
            .search(&["name"], query.search.as_deref());

        fetch_page(
            &self.pool,
            &format!("SELECT {} FROM companies", COMPANY_COLUMNS),
            "SELECT COUNT(*) FROM companies",
            &filters,
            "name, id",
            PageRequest::new(query.page, query.limit),
        )
        .await
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Company> {
        let sql = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        let sql = &sql;
        let pool = &self.pool;
        retry::read(|| async move {
            sqlx::query_as::<_, Company>(sql)
                .bind(id)
                .fetch_optional(pool)
                .await
        })
        .await?
        .ok_or_else(|| Error::NotFound(format!("Company {} not found", id)))
    }

    async fn ensure_name_free(&self, name: &str, except: Option<Uuid>) -> Result<()> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM companies WHERE is_active AND LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name.trim())
        .bind(except)
        .fetch_one(&self.pool)
        .await?;
        if taken {
            return Err(Error::Conflict(format!(
                "An active company named {} already exists",
                name.trim()
            )));
        }
        Ok(())
    }

    pub async fn create(&self, payload: CreateCompanyPayload) -> Result<Uuid> {
        self.ensure_name_free(&payload.name, None).await?;

        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO companies (
                name, industry, city, address, website,
                contact_person, contact_email, contact_phone, description
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(payload.name.trim())
        .bind(&payload.industry)
        .bind(&payload.city)
        .bind(&payload.address)
        .bind(&payload.website)
        .bind(&payload.contact_person)
        .bind(&payload.contact_email)
        .bind(&payload.contact_phone)
        .bind(&payload.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateCompanyPayload) -> Result<()> {
        let current = self.get_by_id(id).await?;
        let becomes_active = payload.is_active.unwrap_or(current.is_active);
        if becomes_active {
            let name = payload.name.as_deref().unwrap_or(&current.name);
            self.ensure_name_free(name, Some(id)).await?;
        }

        sqlx::query(
            r#"
            UPDATE companies
            SET
                name = COALESCE($2, name),
                industry = COALESCE($3, industry),
                city = COALESCE($4, city),
                address = COALESCE($5, address),
                website = COALESCE($6, website),
                contact_person = COALESCE($7, contact_person),
                contact_email = COALESCE($8, contact_email),
                contact_phone = COALESCE($9, contact_phone),
                description = COALESCE($10, description),
                is_active = COALESCE($11, is_active),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(payload.name.as_deref().map(str::trim))
        .bind(&payload.industry)
        .bind(&payload.city)
        .bind(&payload.address)
        .bind(&payload.website)
        .bind(&payload.contact_person)
        .bind(&payload.contact_email)
        .bind(&payload.contact_phone)
        .bind(&payload.description)
        .bind(payload.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft delete. Refused while any of the company's jobs has an open
    /// application; otherwise its live jobs are closed in the same transaction.
    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        let active: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM companies WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if active != Some(true) {
            return Err(Error::NotFound(format!("Company {} not found", id)));
        }

        // waits out in-flight submits, which hold their job FOR SHARE
        sqlx::query("SELECT id FROM jobs WHERE company_id = $1 ORDER BY id FOR UPDATE")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        let open: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM applications a JOIN jobs j ON j.id = a.job_id \
             WHERE j.company_id = $1 AND a.status IN {}",
            ApplicationStatus::OPEN_SQL
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if open > 0 {
            return Err(Error::Conflict(format!(
                "Company has {} open application(s) across its jobs",
                open
            )));
        }

        let closed = engine::jobs::close_company_jobs(&mut tx, id, actor).await?;

        sqlx::query("UPDATE companies SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(company_id = %id, jobs_closed = closed, "company deactivated");
        Ok(closed)
    }
}
