use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{TodoFilter, TodoRequest};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{AppJson, AppPath, AppQuery},
    state::AppState,
    store::{Todo, TodoFields},
};

pub fn todo_routes() -> Router<AppState> {
    Router::new()
        .route("/todos", get(list_todos).post(create_todo))
        .route(
            "/todos/:id",
            get(get_todo).put(update_todo).delete(delete_todo),
        )
}

#[instrument(skip(state))]
pub async fn list_todos(
    State(state): State<AppState>,
    auth: AuthUser,
    AppQuery(filter): AppQuery<TodoFilter>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.store.list_todos(auth.id, filter.category_id).await?;
    Ok(Json(todos))
}

#[instrument(skip(state))]
pub async fn get_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Todo>, ApiError> {
    Ok(Json(state.store.get_todo(auth.id, id).await?))
}

/// A category the caller does not own is reported as not found.
#[instrument(skip(state, payload))]
pub async fn create_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<TodoRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Todo>), ApiError> {
    let fields = TodoFields::try_from(payload)?;
    let todo = state.store.create_todo(auth.id, fields).await?;
    info!(user_id = auth.id, todo_id = todo.id, "todo created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/api/v1/todos/{}", todo.id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(todo)))
}

#[instrument(skip(state, payload))]
pub async fn update_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i64>,
    AppJson(payload): AppJson<TodoRequest>,
) -> Result<Json<Todo>, ApiError> {
    let fields = TodoFields::try_from(payload)?;
    let todo = state.store.update_todo(auth.id, id, fields).await?;
    Ok(Json(todo))
}

#[instrument(skip(state))]
pub async fn delete_todo(
    State(state): State<AppState>,
    auth: AuthUser,
    AppPath(id): AppPath<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_todo(auth.id, id).await?;
    info!(user_id = auth.id, todo_id = id, "todo deleted");
    Ok(StatusCode::NO_CONTENT)
}
