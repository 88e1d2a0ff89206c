//! API request/response models for ingredients.

use crate::db::models::ingredients::{IngredientCreateDBRequest, IngredientDBResponse};
use crate::errors::Error;
use crate::types::IngredientId;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

impl From<IngredientDBResponse> for IngredientResponse {
    fn from(db: IngredientDBResponse) -> Self {
        Self {
            id: db.id,
            name: db.name,
            measurement_unit: db.measurement_unit,
        }
    }
}

/// Admin request to create an ingredient
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IngredientCreate {
    pub name: String,
    /// Free text, e.g. "g" or "ml"
    pub measurement_unit: String,
}

impl IngredientCreate {
    pub fn validate(&self) -> Result<(), Error> {
        if self.name.is_empty() {
            return Err(Error::Validation {
                field: "name".to_string(),
                message: "name must not be empty".to_string(),
            });
        }
        if self.measurement_unit.is_empty() {
            return Err(Error::Validation {
                field: "measurement_unit".to_string(),
                message: "measurement unit must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

impl From<IngredientCreate> for IngredientCreateDBRequest {
    fn from(api: IngredientCreate) -> Self {
        Self {
            name: api.name,
            measurement_unit: api.measurement_unit,
        }
    }
}

/// Query parameters for listing ingredients
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListIngredientsQuery {
    /// Case-insensitive name prefix filter
    pub name: Option<String>,
}
