//! API request/response models for tags.

use crate::db::models::tags::{TagCreateDBRequest, TagDBResponse};
use crate::errors::Error;
use crate::types::TagId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<TagDBResponse> for TagResponse {
    fn from(db: TagDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            color: db.color,
            slug: db.slug,
        }
    }
}

/// Admin request to create a tag
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TagCreate {
    pub name: String,
    /// Hex color, `#RGB` or `#RRGGBB`
    pub color: String,
    /// URL-safe identifier: letters, digits, `-` and `_`
    pub slug: String,
}

impl TagCreate {
    /// Check format constraints before hitting the unique indexes
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::Validation {
                field: "name".to_string(),
                message: "name must not be empty".to_string(),
            });
        }
        if !is_hex_color(&self.color) {
            return Err(Error::Validation {
                field: "color".to_string(),
                message: "color must be a hex color like #AABBCC".to_string(),
            });
        }
        if self.slug.is_empty() || !self.slug.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::Validation {
                field: "slug".to_string(),
                message: "slug may only contain letters, digits, '-' and '_'".to_string(),
            });
        }
        Ok(())
    }
}

impl From<TagCreate> for TagCreateDBRequest {
    fn from(api: TagCreate) -> Self {
        Self {
            name: api.name,
            color: api.color,
            slug: api.slug,
        }
    }
}

fn is_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };
    (digits.len() == 3 || digits.len() == 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}
