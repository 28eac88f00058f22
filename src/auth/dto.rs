use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, extract::AppJson, store::User};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// OAuth2 password-grant form, as sent by standard password-flow clients.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    pub username: String,
    pub password: String,
}

/// Login credentials from either a JSON body or an urlencoded OAuth2 form.
#[derive(Debug)]
pub struct LoginCredentials(pub LoginRequest);

#[async_trait]
impl<S> FromRequest<S> for LoginCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(form) = Form::<PasswordForm>::from_request(req, state).await?;
            return Ok(Self(LoginRequest {
                email: form.username,
                password: form.password,
            }));
        }
        let AppJson(body) = AppJson::<LoginRequest>::from_request(req, state).await?;
        Ok(Self(body))
    }
}

/// Credential update for the calling user. Absent fields keep their value.
#[derive(Debug, Deserialize)]
pub struct UpdateCredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64, // seconds
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
        }
    }
}
