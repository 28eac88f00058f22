use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::UpdateCredentialsRequest,
    password::{hash_password, verify_dummy, verify_password},
};
use crate::{
    error::ApiError,
    store::{Store, User},
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn validated_email(raw: &str) -> Result<String, ApiError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    Ok(email)
}

fn validated_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Runs Argon2 work on the blocking pool so login bursts do not stall the
/// async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(e.into()))
}

/// Creates an account; the raw password never reaches the store.
pub async fn register(store: &dyn Store, email: &str, password: &str) -> Result<User, ApiError> {
    let email = validated_email(email)?;
    validated_password(password)?;

    let password = password.to_owned();
    let hash = blocking(move || hash_password(&password)).await??;
    let user = store.create_user(&email, &hash).await?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Resolves credentials to a user. Unknown email and wrong password yield the
/// same `Unauthenticated` error after the same amount of hashing work.
pub async fn authenticate(
    store: &dyn Store,
    email: &str,
    password: &str,
) -> Result<User, ApiError> {
    let email = normalize_email(email);

    let plain = password.to_owned();
    let Some(user) = store.find_user_by_email(&email).await? else {
        blocking(move || verify_dummy(&plain)).await?;
        warn!(email = %email, "login unknown email");
        return Err(ApiError::Unauthenticated);
    };

    let digest = user.password_hash.clone();
    if !blocking(move || verify_password(&plain, &digest)).await? {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::Unauthenticated);
    }

    info!(user_id = user.id, "user logged in");
    Ok(user)
}

pub async fn update_credentials(
    store: &dyn Store,
    user_id: i64,
    req: UpdateCredentialsRequest,
) -> Result<User, ApiError> {
    if req.email.is_none() && req.password.is_none() {
        return Err(ApiError::Validation("Nothing to update".into()));
    }
    let current = store.find_user(user_id).await?.ok_or(ApiError::NotFound)?;

    let email = match req.email {
        Some(raw) => validated_email(&raw)?,
        None => current.email,
    };
    let hash = match req.password {
        Some(raw) => {
            validated_password(&raw)?;
            blocking(move || hash_password(&raw)).await??
        }
        None => current.password_hash,
    };

    let user = store.update_user_credentials(user_id, &email, &hash).await?;
    info!(user_id = user.id, "credentials updated");
    Ok(user)
}
