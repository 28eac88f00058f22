use std::str::FromStr;

use jsonwebtoken::Algorithm;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub issuer: String,
    pub audience: String,
    pub default_ttl_minutes: i64,
    pub login_ttl_minutes: i64,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup. Empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let database_url = required("DATABASE_URL")?;
        let secret = required("JWT_SECRET")?;
        let algorithm = parse_algorithm(&required("JWT_ALGORITHM")?)?;

        let jwt = JwtConfig {
            secret,
            algorithm,
            issuer: get("JWT_ISSUER").unwrap_or_else(|| "todo-api".into()),
            audience: get("JWT_AUDIENCE").unwrap_or_else(|| "todo-api-users".into()),
            default_ttl_minutes: positive(&get, "JWT_DEFAULT_TTL_MINUTES", 1000)?,
            login_ttl_minutes: positive(&get, "JWT_LOGIN_TTL_MINUTES", 20)?,
        };

        Ok(Self {
            database_url,
            database_max_connections: positive(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
            host: get("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: positive(&get, "APP_PORT", 8080)?,
            jwt,
        })
    }
}

/// Only the HMAC family is usable with a shared secret.
fn parse_algorithm(raw: &str) -> Result<Algorithm, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: "JWT_ALGORITHM",
        reason,
    };
    let alg = Algorithm::from_str(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match alg {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
        other => Err(invalid(format!("{other:?} is not an HMAC algorithm"))),
    }
}

fn positive<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    let Some(raw) = get(key) else {
        return Ok(default);
    };
    let value = raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })?;
    if value <= T::default() {
        return Err(ConfigError::Invalid {
            key,
            reason: "must be positive".into(),
        });
    }
    Ok(value)
}
