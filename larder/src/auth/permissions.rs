//! Permission checking for mutating operations.
//!
//! Authorization is ownership-based: a recipe may be mutated by its author
//! or by an administrator. Reference data (tags, ingredients) is
//! administrator-only. Reads are public everywhere, so there is no read
//! check.

use crate::api::models::users::CurrentUser;
use crate::errors::{Error, Result};
use crate::types::{Operation, Resource, UserId};

/// Owner-or-admin guard for recipe mutations
pub fn ensure_can_modify_recipe(user: &CurrentUser, author_id: UserId, action: Operation) -> Result<()> {
    if user.id == author_id || user.is_admin {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action,
            resource: Resource::Recipes,
        })
    }
}

/// Admin guard for reference-data mutations
pub fn ensure_admin(user: &CurrentUser, resource: Resource, action: Operation) -> Result<()> {
    if user.is_admin {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions { action, resource })
    }
}
