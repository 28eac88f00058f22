use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use super::{Category, CategoryRef, Store, StoreError, Todo, TodoFields, User};

#[derive(Debug, Clone)]
struct TodoRecord {
    id: i64,
    owner_id: i64,
    fields: TodoFields,
    created_at: OffsetDateTime,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: Vec<User>,
    categories: Vec<Category>,
    todos: Vec<TodoRecord>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn owned_category(&self, owner_id: i64, id: i64) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.id == id && c.owner_id == owner_id)
    }

    fn view(&self, rec: &TodoRecord) -> Option<Todo> {
        let cat = self.owned_category(rec.owner_id, rec.fields.category_id)?;
        Some(Todo {
            id: rec.id,
            title: rec.fields.title.clone(),
            description: rec.fields.description.clone(),
            priority: rec.fields.priority,
            complete: rec.fields.complete,
            owner_id: rec.owner_id,
            category: CategoryRef {
                id: cat.id,
                name: cat.name.clone(),
            },
            created_at: rec.created_at,
        })
    }
}

/// In-process store mirroring the Postgres schema's constraints and cascades.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == email) {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        let user = User {
            id: t.next_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.users.push(user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_user_credentials(
        &self,
        id: i64,
        email: &str,
        password_hash: &str,
    ) -> Result<User, StoreError> {
        let mut t = self.lock();
        if t.users.iter().any(|u| u.email == email && u.id != id) {
            return Err(StoreError::Conflict("email already registered".into()));
        }
        let user = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        user.email = email.to_string();
        user.password_hash = password_hash.to_string();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: i64) -> Result<(), StoreError> {
        let mut t = self.lock();
        let before = t.users.len();
        t.users.retain(|u| u.id != id);
        if t.users.len() == before {
            return Err(StoreError::NotFound);
        }
        t.categories.retain(|c| c.owner_id != id);
        t.todos.retain(|r| r.owner_id != id);
        Ok(())
    }

    async fn list_categories(&self, owner_id: i64) -> Result<Vec<Category>, StoreError> {
        Ok(self
            .lock()
            .categories
            .iter()
            .filter(|c| c.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn get_category(&self, owner_id: i64, id: i64) -> Result<Category, StoreError> {
        self.lock()
            .owned_category(owner_id, id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_category(&self, owner_id: i64, name: &str) -> Result<Category, StoreError> {
        let mut t = self.lock();
        if !t.users.iter().any(|u| u.id == owner_id) {
            return Err(StoreError::NotFound);
        }
        let category = Category {
            id: t.next_id(),
            name: name.to_string(),
            owner_id,
            created_at: OffsetDateTime::now_utc(),
        };
        t.categories.push(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        owner_id: i64,
        id: i64,
        name: &str,
    ) -> Result<Category, StoreError> {
        let mut t = self.lock();
        let category = t
            .categories
            .iter_mut()
            .find(|c| c.id == id && c.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        category.name = name.to_string();
        Ok(category.clone())
    }

    async fn delete_category(&self, owner_id: i64, id: i64) -> Result<(), StoreError> {
        let mut t = self.lock();
        if t.owned_category(owner_id, id).is_none() {
            return Err(StoreError::NotFound);
        }
        t.categories.retain(|c| c.id != id);
        t.todos.retain(|r| r.fields.category_id != id);
        Ok(())
    }

    async fn list_todos(
        &self,
        owner_id: i64,
        category_id: Option<i64>,
    ) -> Result<Vec<Todo>, StoreError> {
        let t = self.lock();
        Ok(t.todos
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .filter(|r| category_id.map_or(true, |c| r.fields.category_id == c))
            .filter_map(|r| t.view(r))
            .collect())
    }

    async fn get_todo(&self, owner_id: i64, id: i64) -> Result<Todo, StoreError> {
        let t = self.lock();
        t.todos
            .iter()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .and_then(|r| t.view(r))
            .ok_or(StoreError::NotFound)
    }

    async fn create_todo(&self, owner_id: i64, fields: TodoFields) -> Result<Todo, StoreError> {
        let mut t = self.lock();
        if t.owned_category(owner_id, fields.category_id).is_none() {
            return Err(StoreError::NotFound);
        }
        let rec = TodoRecord {
            id: t.next_id(),
            owner_id,
            fields,
            created_at: OffsetDateTime::now_utc(),
        };
        let todo = t.view(&rec).ok_or(StoreError::NotFound)?;
        t.todos.push(rec);
        Ok(todo)
    }

    async fn update_todo(
        &self,
        owner_id: i64,
        id: i64,
        fields: TodoFields,
    ) -> Result<Todo, StoreError> {
        let mut t = self.lock();
        if t.owned_category(owner_id, fields.category_id).is_none() {
            return Err(StoreError::NotFound);
        }
        let rec = t
            .todos
            .iter_mut()
            .find(|r| r.id == id && r.owner_id == owner_id)
            .ok_or(StoreError::NotFound)?;
        rec.fields = fields;
        let rec = rec.clone();
        t.view(&rec).ok_or(StoreError::NotFound)
    }

    async fn delete_todo(&self, owner_id: i64, id: i64) -> Result<(), StoreError> {
        let mut t = self.lock();
        let before = t.todos.len();
        t.todos.retain(|r| !(r.id == id && r.owner_id == owner_id));
        if t.todos.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(title: &str, category_id: i64) -> TodoFields {
        TodoFields {
            title: title.into(),
            description: None,
            priority: None,
            complete: false,
            category_id,
        }
    }

    #[tokio::test]
    async fn deleting_category_cascades_to_todos() {
        let store = MemoryStore::new();
        let user = store.create_user("a@example.com", "h").await.unwrap();
        let cat = store.create_category(user.id, "Home").await.unwrap();
        store.create_todo(user.id, fields("Buy milk", cat.id)).await.unwrap();

        store.delete_category(user.id, cat.id).await.unwrap();
        assert!(store.list_todos(user.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_user_cascades_to_owned_rows() {
        let store = MemoryStore::new();
        let user = store.create_user("a@example.com", "h").await.unwrap();
        let cat = store.create_category(user.id, "Home").await.unwrap();
        store.create_todo(user.id, fields("Buy milk", cat.id)).await.unwrap();

        store.delete_user(user.id).await.unwrap();
        assert!(store.list_categories(user.id).await.unwrap().is_empty());
        assert!(store.list_todos(user.id, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user("a@example.com", "h").await.unwrap();
        let err = store.create_user("a@example.com", "h2").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
