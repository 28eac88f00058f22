use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument};

use super::{
    dto::{LoginCredentials, LoginResponse, PublicUser, RegisterRequest, UpdateCredentialsRequest},
    extractors::AuthUser,
    jwt::TokenService,
    services,
};
use crate::{error::ApiError, extract::AppJson, state::AppState, store::User};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register))
        .route("/users/token", post(login))
        .route("/users/me", get(get_me).put(update_me).delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PublicUser>), ApiError> {
    let user = services::register(state.store.as_ref(), &payload.email, &payload.password).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::LOCATION, HeaderValue::from_static("/api/v1/users/me"));
    Ok((StatusCode::CREATED, headers, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    LoginCredentials(payload): LoginCredentials,
) -> Result<Json<LoginResponse>, ApiError> {
    let user =
        services::authenticate(state.store.as_ref(), &payload.email, &payload.password).await?;
    Ok(Json(login_response(&state.tokens, user)?))
}

fn login_response(tokens: &TokenService, user: User) -> Result<LoginResponse, ApiError> {
    let access_token = tokens.issue_for_login(&user).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        ApiError::Internal(e.into())
    })?;

    Ok(LoginResponse {
        access_token,
        token_type: "bearer",
        expires_in: tokens.login_ttl().whole_seconds(),
        user: user.into(),
    })
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    // token may outlive the account
    let user = state
        .store
        .find_user(auth.id)
        .await?
        .ok_or(ApiError::InvalidToken)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<UpdateCredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = services::update_credentials(state.store.as_ref(), auth.id, payload).await?;
    // earlier tokens keep the old email in `sub`; hand back one that matches
    Ok(Json(login_response(&state.tokens, user)?))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<StatusCode, ApiError> {
    state.store.delete_user(auth.id).await?;
    info!(user_id = auth.id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}
