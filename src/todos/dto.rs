use serde::Deserialize;

use crate::{error::ApiError, store::TodoFields};

/// Create/replace payload. The owner is never read from the body.
#[derive(Debug, Deserialize)]
pub struct TodoRequest {
    pub title: String,
    pub description: Option<String>,
    pub priority: Option<i32>,
    #[serde(default)]
    pub complete: bool,
    pub category_id: i64,
}

impl TryFrom<TodoRequest> for TodoFields {
    type Error = ApiError;

    fn try_from(req: TodoRequest) -> Result<Self, Self::Error> {
        let title = req.title.trim();
        if title.is_empty() {
            return Err(ApiError::Validation("Title must not be empty".into()));
        }
        Ok(Self {
            title: title.to_string(),
            description: req.description,
            priority: req.priority,
            complete: req.complete,
            category_id: req.category_id,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct TodoFilter {
    pub category_id: Option<i64>,
}
