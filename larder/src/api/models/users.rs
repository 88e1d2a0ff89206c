//! API request/response models for users and subscriptions.

use super::pagination::Pagination;
use super::recipes::RecipeSummaryResponse;
use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Public user profile.
///
/// `is_subscribed` is derived per request: whether the viewer is subscribed
/// to this user. Always false for anonymous viewers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            username: db.username,
            first_name: db.first_name,
            last_name: db.last_name,
            // Derived per viewer; callers overwrite via with_subscribed
            is_subscribed: false,
        }
    }
}

impl UserResponse {
    /// Set the viewer-derived subscription flag
    pub fn with_subscribed(mut self, subscribed: bool) -> Self {
        self.is_subscribed = subscribed;
        self
    }
}

/// The authenticated actor, as carried in the session token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub is_admin: bool,
}

impl From<UserDBResponse> for CurrentUser {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            username: db.username,
            is_admin: db.is_admin,
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// An author the viewer follows: profile plus recipe count and a preview of
/// their recipes (newest first, optionally capped by `recipes_limit`)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
    pub recipes: Vec<RecipeSummaryResponse>,
    pub recipes_count: i64,
}

/// Query parameters for the subscriptions listing
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSubscriptionsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Cap on the number of preview recipes returned per author
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recipes_limit: Option<i64>,
}

/// Query parameters for the subscribe operation
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct SubscribeQuery {
    /// Cap on the number of preview recipes returned for the author
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub recipes_limit: Option<i64>,
}
