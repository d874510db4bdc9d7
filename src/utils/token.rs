use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::admin::Role;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn require_any(&self, allowed: &[Role]) -> Result<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "Role {} may not perform this action",
                self.role
            )))
        }
    }
}

pub fn issue_token(
    secret: &str,
    admin_id: Uuid,
    username: &str,
    role: Role,
    expiry_hours: i64,
) -> Result<(String, i64)> {
    let now = Utc::now();
    let expires_in = Duration::hours(expiry_hours.max(1));
    let claims = Claims {
        sub: admin_id,
        username: username.to_string(),
        role,
        iat: now.timestamp() as usize,
        exp: (now + expires_in).timestamp() as usize,
    };
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| Error::Internal(format!("Failed to sign token: {}", e)))?;
    Ok((token, expires_in.num_seconds()))
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| Error::Unauthorized("invalid_token".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_round_trips_identity() {
        let id = Uuid::new_v4();
        let (token, expires_in) = issue_token("k", id, "root", Role::SuperAdmin, 2).unwrap();
        assert_eq!(expires_in, 7200);
        let claims = verify_token("k", &token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "root");
        assert_eq!(claims.role, Role::SuperAdmin);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let (token, _) = issue_token("k1", Uuid::new_v4(), "a", Role::Manager, 1).unwrap();
        assert!(matches!(verify_token("k2", &token), Err(Error::Unauthorized(_))));
    }

    #[test]
    fn manager_cannot_pass_admin_gate() {
        let (token, _) = issue_token("k", Uuid::new_v4(), "m", Role::Manager, 1).unwrap();
        let claims = verify_token("k", &token).unwrap();
        assert!(claims.require_any(&[Role::Admin, Role::SuperAdmin]).is_err());
        assert!(claims.require_any(&[Role::Manager]).is_ok());
    }
}
