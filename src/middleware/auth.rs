use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{Error, Result};
use crate::utils::token::{verify_token, Claims};
use crate::AppState;

/// `Authorization: Bearer <token>`. `Ok(None)` when the header is absent.
pub fn bearer_token(headers: &HeaderMap) -> Result<Option<&str>> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| Error::Unauthorized("bad_authorization".to_string()))?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(Some(token.trim())),
        _ => Err(Error::Unauthorized("unsupported_scheme".to_string())),
    }
}

pub fn bearer_claims(headers: &HeaderMap, secret: &str) -> Result<Option<Claims>> {
    bearer_token(headers)?
        .map(|token| verify_token(secret, token))
        .transpose()
}

/// Rejects the request unless it carries a valid token; the decoded claims
/// are stored in the request extensions for handlers.
pub async fn require_auth(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match bearer_claims(req.headers(), &state.config.jwt_secret) {
        Ok(Some(claims)) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        Ok(None) => Error::Unauthorized("missing_authorization".to_string()).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::admin::Role;
    use crate::utils::token::issue_token;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    fn headers(value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn missing_header_is_not_an_error() {
        assert!(bearer_token(&HeaderMap::new()).unwrap().is_none());
    }

    #[test]
    fn other_schemes_are_refused() {
        let err = bearer_token(&headers("Basic dXNlcjpwYXNz")).unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
        assert!(bearer_token(&headers("Bearer ")).is_err());
    }

    #[test]
    fn valid_token_yields_claims() {
        let id = Uuid::new_v4();
        let (token, _) = issue_token("secret", id, "ops", Role::Manager, 1).unwrap();
        let claims = bearer_claims(&headers(&format!("Bearer {}", token)), "secret")
            .unwrap()
            .unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::Manager);

        let err = bearer_claims(&headers(&format!("Bearer {}", token)), "other").unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
