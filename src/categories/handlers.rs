use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::CategoryRequest;
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{AppJson, AppPath},
    state::AppState,
    store::Category,
};

pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

fn required_name(payload: &CategoryRequest) -> Result<&str, ApiError> {
    payload
        .validated_name()
        .ok_or_else(|| ApiError::Validation("Category name must not be empty".into()))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Category>>, ApiError> {
    let rows = state.store.list_categories(auth.id).await?;
    Ok(Json(rows))
}

#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(state.store.get_category(auth.id, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Category>), ApiError> {
    let name = required_name(&payload)?;
    let category = state.store.create_category(auth.id, name).await?;
    info!(user_id = auth.id, category_id = category.id, "category created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/categories/{}", category.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(category)))
}

#[instrument(skip(state, payload))]
pub async fn update_category(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let name = required_name(&payload)?;
    let category = state.store.update_category(auth.id, id, name).await?;
    Ok(Json(category))
}

#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_category(auth.id, id).await?;
    info!(user_id = auth.id, category_id = id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}
