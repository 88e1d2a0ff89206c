//! Database models for tags.

use crate::types::TagId;

/// Database request for creating a tag
#[derive(Debug, Clone)]
pub struct TagCreateDBRequest {
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// Database request for updating a tag; `None` fields keep their values
#[derive(Debug, Clone, Default)]
pub struct TagUpdateDBRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub slug: Option<String>,
}

/// Database response for a tag
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TagDBResponse {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}
