//! Database models for ingredients.

use crate::types::IngredientId;

/// Database request for creating an ingredient
#[derive(Debug, Clone)]
pub struct IngredientCreateDBRequest {
    pub name: String,
    pub measurement_unit: String,
}

/// Database request for updating an ingredient; `None` fields keep their values
#[derive(Debug, Clone, Default)]
pub struct IngredientUpdateDBRequest {
    pub name: Option<String>,
    pub measurement_unit: Option<String>,
}

/// Database response for an ingredient
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct IngredientDBResponse {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}
