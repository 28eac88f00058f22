use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use super::jwt::TokenService;
use crate::error::ApiError;

/// Identity resolved from a verified bearer token. Handlers get the caller's
/// identity only through this extractor, never from request bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    Arc<TokenService>: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let tokens = Arc::<TokenService>::from_ref(state);

        let token = bearer_token(parts).ok_or_else(|| {
            warn!("missing or malformed Authorization header");
            ApiError::InvalidToken
        })?;

        let claims = tokens.validate(token).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::InvalidToken
        })?;

        Ok(AuthUser {
            id: claims.id,
            email: claims.sub,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
