use async_trait::async_trait;
use serde::Serialize;
use time::OffsetDateTime;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Row is absent or belongs to another owner.
    #[error("row not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 PHC string, never exposed
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Category as embedded in a to-do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub complete: bool,
    pub owner_id: i64,
    pub category: CategoryRef,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Client-controlled to-do fields, used for both create and full update.
#[derive(Debug, Clone)]
pub struct TodoFields {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    pub complete: bool,
    pub category_id: i64,
}

/// Persistence boundary. Every category and to-do call is scoped by `owner_id`;
/// rows of other owners behave exactly like absent rows.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;
    async fn update_user_credentials(
        &self,
        id: i64,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError>;
    /// Removes the user together with every owned category and to-do.
    async fn delete_user(&self, id: i64) -> Result<(), StoreError>;

    async fn list_categories(&self, owner_id: i64) -> Result<Vec<Category>, StoreError>;
    async fn get_category(&self, owner_id: i64, id: i64) -> Result<Category, StoreError>;
    async fn create_category(&self, owner_id: i64, name: &str) -> Result<Category, StoreError>;
    async fn update_category(
        &self,
        owner_id: i64,
        id: i64,
        name: &str,
    ) -> Result<Category, StoreError>;
    /// Cascades to the category's to-dos.
    async fn delete_category(&self, owner_id: i64, id: i64) -> Result<(), StoreError>;

    async fn list_todos(
        &self,
        owner_id: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Todo>, StoreError>;
    async fn get_todo(&self, owner_id: i64, id: i64) -> Result<Todo, StoreError>;
    /// Fails with `NotFound` unless `fields.category_id` is owned by `owner_id`.
    async fn create_todo(&self, owner_id: i64, fields: TodoFields) -> Result<Todo, StoreError>;
    async fn update_todo(
        &self,
        owner_id: i64,
        id: i64,
        fields: TodoFields,
    ) -> Result<Todo, StoreError>;
    async fn delete_todo(&self, owner_id: i64, id: i64) -> Result<(), StoreError>;
}
