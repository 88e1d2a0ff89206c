//! Database models for the recipe aggregate.
//!
//! A recipe is written and read as one unit: the base row plus its tag set
//! and its ingredient-with-amount set. The read shape additionally carries
//! the two per-viewer booleans (`is_favorited`, `is_in_shopping_cart`),
//! which are derived at query time and never read back from the recipe row.

use crate::db::models::tags::TagDBResponse;
use crate::db::models::users::UserDBResponse;
use crate::types::{IngredientId, RecipeId, TagId, UserId};
use chrono::{DateTime, Utc};

/// One (ingredient, amount) entry of a recipe write
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IngredientAmount {
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

/// Database request for creating a recipe aggregate
#[derive(Debug, Clone)]
pub struct RecipeCreateDBRequest {
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub tag_ids: Vec<TagId>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Database request for updating a recipe aggregate.
///
/// Both association sets are always replaced in full; `image: None` keeps the
/// stored image.
#[derive(Debug, Clone)]
pub struct RecipeUpdateDBRequest {
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub tag_ids: Vec<TagId>,
    pub ingredients: Vec<IngredientAmount>,
}

/// One ingredient line of an assembled recipe
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RecipeIngredientDBResponse {
    pub ingredient_id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Fully assembled recipe aggregate
#[derive(Debug, Clone)]
pub struct RecipeDBResponse {
    pub id: RecipeId,
    pub author: UserDBResponse,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub tags: Vec<TagDBResponse>,
    pub ingredients: Vec<RecipeIngredientDBResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Short recipe form used in membership responses and subscription previews
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecipeSummaryDBResponse {
    pub id: RecipeId,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

/// One aggregated shopping-list line: amounts summed per (name, unit)
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}
