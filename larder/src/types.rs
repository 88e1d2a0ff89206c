//! Common type definitions shared across the crate.
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`UserId`]: User account identifier
//! - [`RecipeId`]: Recipe identifier
//! - [`TagId`]: Tag identifier
//! - [`IngredientId`]: Ingredient identifier
//!
//! The [`Resource`] and [`Operation`] enums describe what an actor attempted
//! when a permission check fails; they exist to phrase
//! [`crate::errors::Error::InsufficientPermissions`] consistently.

use std::fmt;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type RecipeId = Uuid;
pub type TagId = Uuid;
pub type IngredientId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Recipes,
    Tags,
    Ingredients,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Read => write!(f, "read"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "user"),
            Resource::Recipes => write!(f, "recipe"),
            Resource::Tags => write!(f, "tag"),
            Resource::Ingredients => write!(f, "ingredient"),
        }
    }
}
