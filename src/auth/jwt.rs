use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{config::JwtConfig, store::User};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("failed to sign token: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("token is expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
}

/// Verified token payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // user email
    pub id: i64,     // user id
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

/// Issues and validates stateless bearer tokens. Built once from `JwtConfig`
/// and shared read-only.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    issuer: String,
    audience: String,
    default_ttl: Duration,
    login_ttl: Duration,
}

impl TokenService {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm: cfg.algorithm,
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            default_ttl: Duration::minutes(cfg.default_ttl_minutes),
            login_ttl: Duration::minutes(cfg.login_ttl_minutes),
        }
    }

    pub fn login_ttl(&self) -> Duration {
        self.login_ttl
    }

    /// Signs a token for `user`; `ttl` falls back to the default policy.
    pub fn issue(&self, user: &User, ttl: Option<Duration>) -> Result<String, TokenError> {
        self.issue_at(user, OffsetDateTime::now_utc(), ttl.unwrap_or(self.default_ttl))
    }

    pub fn issue_for_login(&self, user: &User) -> Result<String, TokenError> {
        self.issue(user, Some(self.login_ttl))
    }

    fn issue_at(
        &self,
        user: &User,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.email.clone(),
            id: user.id,
            iat: now.unix_timestamp(),
            exp: (now + ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(TokenError::Encoding)?;
        debug!(user_id = user.id, "jwt signed");
        Ok(token)
    }

    /// Checks signature, algorithm, expiry, issuer and audience. A token lacking
    /// `sub` or `id` does not deserialize and is reported as invalid.
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        Ok(data.claims)
    }
}
