use async_trait::async_trait;
use sqlx::{postgres::PgExecutor, FromRow, PgPool};
use time::OffsetDateTime;

use super::{Category, CategoryRef, Store, StoreError, Todo, TodoFields, User};

/// Flat join row; `Todo` nests the category.
#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: Option<String>,
    priority: Option<i32>,
    complete: bool,
    owner_id: i64,
    category_id: i64,
    category_name: String,
    created_at: OffsetDateTime,
}

impl From<TodoRow> for Todo {
    fn from(r: TodoRow) -> Self {
        Self {
            id: r.id,
            title: r.title,
            description: r.description,
            priority: r.priority,
            complete: r.complete,
            owner_id: r.owner_id,
            category: CategoryRef {
                id: r.category_id,
                name: r.category_name,
            },
            created_at: r.created_at,
        }
    }
}

const TODO_BY_ID: &str = r#"
    SELECT t.id, t.title, t.description, t.priority, t.complete, t.owner_id,
           t.category_id, c.name AS category_name, t.created_at
    FROM todos t
    JOIN categories c ON c.id = t.category_id AND c.owner_id = t.owner_id
    WHERE t.id = $1 AND t.owner_id = $2
"#;

const TODOS_BY_OWNER: &str = r#"
    SELECT t.id, t.title, t.description, t.priority, t.complete, t.owner_id,
           t.category_id, c.name AS category_name, t.created_at
    FROM todos t
    JOIN categories c ON c.id = t.category_id AND c.owner_id = t.owner_id
    WHERE t.owner_id = $1 AND ($2::BIGINT IS NULL OR t.category_id = $2)
    ORDER BY t.id
"#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_db(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            StoreError::Conflict("email already registered".into())
        }
        sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => StoreError::NotFound,
        other => StoreError::Database(other),
    }
}

async fn fetch_todo<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: i64,
    id: i64,
) -> Result<Todo, StoreError> {
    let row = sqlx::query_as::<_, TodoRow>(TODO_BY_ID)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await
        .map_err(map_db)?;
    row.map(Todo::from).ok_or(StoreError::NotFound)
}

async fn ensure_category_owned<'e, E: PgExecutor<'e>>(
    executor: E,
    owner_id: i64,
    category_id: i64,
) -> Result<(), StoreError> {
    let found = sqlx::query_as::<_, (i64,)>(
        r#"
        SELECT id FROM categories
        WHERE id = $1 AND owner_id = $2
        FOR SHARE
        "#,
    )
    .bind(category_id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await
    .map_err(map_db)?;
    found.map(|_| ()).ok_or(StoreError::NotFound)
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(
            r#"SELECT id, email, password_hash, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db)
    }

    async fn update_user_credentials(
        &self,
        id: i64,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET email = $2, password_hash = $3
            WHERE id = $1
            RETURNING id, email, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db)?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        // categories and todos go with it via ON DELETE CASCADE
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_categories(&self, owner_id: i64) -> Result<Vec<Category>, StoreError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM categories
            WHERE owner_id = $1
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db)
    }

    async fn get_category(&self, owner_id: i64, id: i64) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, owner_id, created_at
            FROM categories
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db)?
        .ok_or(StoreError::NotFound)
    }

    async fn create_category(&self, owner_id: i64, name: &str) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, owner_id)
            VALUES ($1, $2)
            RETURNING id, name, owner_id, created_at
            "#,
        )
        .bind(name)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db)
    }

    async fn update_category(
        &self,
        owner_id: i64,
        id: i64,
        name: &str,
    ) -> Result<Category, StoreError> {
        sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories SET name = $3
            WHERE id = $1 AND owner_id = $2
            RETURNING id, name, owner_id, created_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db)?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_category(&self, owner_id: i64, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM categories WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_todos(
        &self,
        owner_id: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, TodoRow>(TODOS_BY_OWNER)
            .bind(owner_id)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await
            .map_err(map_db)?;
        Ok(rows.into_iter().map(Todo::from).collect())
    }

    async fn get_todo(&self, owner_id: i64, id: i64) -> Result<Todo, StoreError> {
        fetch_todo(&self.pool, owner_id, id).await
    }

    async fn create_todo(&self, owner_id: i64, fields: TodoFields) -> Result<Todo, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db)?;

        ensure_category_owned(&mut *tx, owner_id, fields.category_id).await?;

        let (id,) = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO todos (title, description, priority, complete, owner_id, category_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.priority)
        .bind(fields.complete)
        .bind(owner_id)
        .bind(fields.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db)?;

        let todo = fetch_todo(&mut *tx, owner_id, id).await?;
        tx.commit().await.map_err(map_db)?;
        Ok(todo)
    }

    async fn update_todo(
        &self,
        owner_id: i64,
        id: i64,
        fields: TodoFields,
    ) -> Result<Todo, StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db)?;

        ensure_category_owned(&mut *tx, owner_id, fields.category_id).await?;

        let res = sqlx::query(
            r#"
            UPDATE todos
            SET title = $3, description = $4, priority = $5, complete = $6, category_id = $7
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&fields.title)
        .bind(&fields.description)
        .bind(fields.priority)
        .bind(fields.complete)
        .bind(fields.category_id)
        .execute(&mut *tx)
        .await
        .map_err(map_db)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        let todo = fetch_todo(&mut *tx, owner_id, id).await?;
        tx.commit().await.map_err(map_db)?;
        Ok(todo)
    }

    async fn delete_todo(&self, owner_id: i64, id: i64) -> Result<(), StoreError> {
        let res = sqlx::query("DELETE FROM todos WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(map_db)?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
