use serde::Deserialize;

/// Body for both create and rename. There is no owner field; the owner is
/// always the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

impl CategoryRequest {
    pub fn validated_name(&self) -> Option<&str> {
        let name = self.name.trim();
        (!name.is_empty()).then_some(name)
    }
}
