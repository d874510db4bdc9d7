use sqlx::PgPool;
use uuid::Uuid;

use crate::dto::auth_dto::{LoginPayload, LoginResponse, RegisterPayload};
use crate::error::{Error, Result};
use crate::models::admin::{Admin, Role};
use crate::utils::crypto::{hash_password, verify_password};
use crate::utils::token::{issue_token, Claims};

const ADMIN_COLUMNS: &str = "id, username, email, password_hash, full_name, role, is_active, last_login_at, created_at, updated_at";

#[derive(Clone)]
pub struct AuthService {
    pool: PgPool,
    jwt_secret: String,
    expiry_hours: i64,
}

impl AuthService {
    pub fn new(pool: PgPool, jwt_secret: String, expiry_hours: i64) -> Self {
        Self {
            pool,
            jwt_secret,
            expiry_hours,
        }
    }

    /// The first admin bootstraps as super_admin without a token; after that
    /// only a super_admin may register others.
    pub async fn register(&self, payload: RegisterPayload, caller: Option<&Claims>) -> Result<Admin> {
        let password_hash = hash_password(&payload.password)
            .map_err(|e| Error::Internal(format!("Failed to hash password: {}", e)))?;

        let mut tx = self.pool.begin().await?;
        sqlx::query("LOCK TABLE admins IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admins")
            .fetch_one(&mut *tx)
            .await?;
        let role = if existing == 0 {
            Role::SuperAdmin
        } else {
            match caller {
                None => {
                    return Err(Error::Unauthorized(
                        "A super_admin token is required to register admins".to_string(),
                    ))
                }
                Some(claims) => claims.require_any(&[Role::SuperAdmin])?,
            }
            payload.role.unwrap_or(Role::Manager)
        };

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM admins WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($2))",
        )
        .bind(payload.username.trim())
        .bind(payload.email.trim())
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(Error::Conflict(
                "Username or email is already registered".to_string(),
            ));
        }

        let admin = sqlx::query_as::<_, Admin>(&format!(
            r#"
            INSERT INTO admins (username, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            ADMIN_COLUMNS
        ))
        .bind(payload.username.trim())
        .bind(payload.email.trim())
        .bind(&password_hash)
        .bind(&payload.full_name)
        .bind(role.as_str())
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        tracing::info!(admin_id = %admin.id, role = %admin.role, "admin registered");
        Ok(admin)
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse> {
        let admin = sqlx::query_as::<_, Admin>(&format!(
            "SELECT {} FROM admins WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1)",
            ADMIN_COLUMNS
        ))
        .bind(payload.username.trim())
        .fetch_optional(&self.pool)
        .await?;

        let invalid = || Error::Unauthorized("Invalid username or password".to_string());
        let Some(mut admin) = admin else {
            return Err(invalid());
        };
        let verified = verify_password(&payload.password, &admin.password_hash)
            .map_err(|e| Error::Internal(format!("Stored password hash is unreadable: {}", e)))?;
        if !verified {
            return Err(invalid());
        }
        if !admin.is_active {
            return Err(Error::Forbidden("Account is disabled".to_string()));
        }

        admin.last_login_at = sqlx::query_scalar(
            "UPDATE admins SET last_login_at = NOW() WHERE id = $1 RETURNING last_login_at",
        )
        .bind(admin.id)
        .fetch_one(&self.pool)
        .await?;

        let (token, expires_in) = issue_token(
            &self.jwt_secret,
            admin.id,
            &admin.username,
            admin.role,
            self.expiry_hours,
        )?;
        Ok(LoginResponse {
            token,
            expires_in,
            admin,
        })
    }

    pub async fn profile(&self, admin_id: Uuid) -> Result<Admin> {
        sqlx::query_as::<_, Admin>(&format!("SELECT {} FROM admins WHERE id = $1", ADMIN_COLUMNS))
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Admin {} not found", admin_id)))
    }
}
