//! API request/response models for recipes.
//!
//! The write payload ([`RecipeWrite`]) and the read view ([`RecipeResponse`])
//! are two explicitly separate types selected by the call site: handlers
//! deserialize the former, run its validation pipeline, and always answer
//! with the latter.

use super::tags::TagResponse;
use super::users::UserResponse;
use crate::db::models::recipes::{
    IngredientAmount, RecipeDBResponse, RecipeIngredientDBResponse, RecipeSummaryDBResponse,
};
use crate::errors::Error;
use crate::types::{IngredientId, RecipeId, TagId, UserId};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

/// One (ingredient, amount) entry of a recipe write payload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientEntry {
    #[schema(value_type = String, format = "uuid")]
    pub id: IngredientId,
    pub amount: i32,
}

/// Write payload for creating or updating a recipe.
///
/// Updates are full replaces: the tag set and the ingredient set given here
/// become the recipe's complete sets.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeWrite {
    pub name: String,
    pub text: String,
    /// Base64 data URL (`data:image/...;base64,...`); omitted keeps the
    /// stored image on update
    pub image: Option<String>,
    pub cooking_time: i32,
    #[schema(value_type = Vec<String>)]
    pub tags: Vec<TagId>,
    pub ingredients: Vec<IngredientEntry>,
}

impl RecipeWrite {
    /// Validation pipeline: an ordered sequence of independent checks, each
    /// producing a structured failure reason, short-circuiting on the first
    /// failure.
    pub fn validate(&self) -> Result<(), Error> {
        if self.tags.is_empty() {
            return Err(Error::Validation {
                field: "tags".to_string(),
                message: "tags must be non-empty and unique".to_string(),
            });
        }

        let mut seen_tags = HashSet::new();
        if !self.tags.iter().all(|tag| seen_tags.insert(tag)) {
            return Err(Error::Validation {
                field: "tags".to_string(),
                message: "tags must be non-empty and unique".to_string(),
            });
        }

        if self.ingredients.is_empty() {
            return Err(Error::Validation {
                field: "ingredients".to_string(),
                message: "at least one ingredient is required".to_string(),
            });
        }

        let mut seen_ingredients = HashSet::new();
        if !self.ingredients.iter().all(|entry| seen_ingredients.insert(entry.id)) {
            return Err(Error::Validation {
                field: "ingredients".to_string(),
                message: "duplicate ingredient".to_string(),
            });
        }

        if self.ingredients.iter().any(|entry| entry.amount < 1) {
            return Err(Error::Validation {
                field: "amount".to_string(),
                message: "amount must be a positive integer".to_string(),
            });
        }

        if self.cooking_time < 1 {
            return Err(Error::Validation {
                field: "cooking_time".to_string(),
                message: "cooking time must be at least 1 minute".to_string(),
            });
        }

        Ok(())
    }

    /// The ingredient entries as database association values
    pub fn ingredient_amounts(&self) -> Vec<IngredientAmount> {
        self.ingredients
            .iter()
            .map(|entry| IngredientAmount {
                ingredient_id: entry.id,
                amount: entry.amount,
            })
            .collect()
    }
}

/// One ingredient line of a recipe read view
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeIngredientResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredientDBResponse> for RecipeIngredientResponse {
    fn from(db: RecipeIngredientDBResponse) -> Self {
        Self {
            id: db.ingredient_id,
            name: db.name,
            measurement_unit: db.measurement_unit,
            amount: db.amount,
        }
    }
}

/// Full recipe read view.
///
/// `is_favorited` and `is_in_shopping_cart` are derived for the requesting
/// viewer when the aggregate is loaded; anonymous viewers always see false.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RecipeId,
    pub tags: Vec<TagResponse>,
    pub author: UserResponse,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub image: Option<String>,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

impl From<RecipeDBResponse> for RecipeResponse {
    fn from(db: RecipeDBResponse) -> Self {
        Self {
            id: db.id,
            tags: db.tags.into_iter().map(TagResponse::from).collect(),
            author: UserResponse::from(db.author),
            ingredients: db.ingredients.into_iter().map(RecipeIngredientResponse::from).collect(),
            is_favorited: db.is_favorited,
            is_in_shopping_cart: db.is_in_shopping_cart,
            image: db.image,
            name: db.name,
            text: db.text,
            cooking_time: db.cooking_time,
        }
    }
}

impl RecipeResponse {
    /// Set the viewer-derived subscription flag on the embedded author
    pub fn with_author_subscribed(mut self, subscribed: bool) -> Self {
        self.author.is_subscribed = subscribed;
        self
    }
}

/// Short recipe form used in membership responses and subscription previews
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecipeSummaryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: RecipeId,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<RecipeSummaryDBResponse> for RecipeSummaryResponse {
    fn from(db: RecipeSummaryDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            image: db.image,
            cooking_time: db.cooking_time,
        }
    }
}

/// Query parameters for listing recipes
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListRecipesQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: super::pagination::Pagination,

    /// Only recipes by this author
    #[param(value_type = Option<String>)]
    #[schema(value_type = Option<String>, format = "uuid")]
    pub author: Option<UserId>,

    /// Tag slugs, comma-separated; a recipe matches when it carries any of them
    pub tags: Option<String>,

    /// Pass 1 to only list recipes the viewer has favorited
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub is_favorited: Option<u8>,

    /// Pass 1 to only list recipes in the viewer's shopping cart
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub is_in_shopping_cart: Option<u8>,
}

impl ListRecipesQuery {
    /// Parse the comma-separated tag slugs
    pub fn tag_slugs(&self) -> Vec<String> {
        self.tags
            .as_deref()
            .map(|tags| tags.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}
