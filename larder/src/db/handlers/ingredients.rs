//! Database repository for ingredients.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::ingredients::{IngredientCreateDBRequest, IngredientDBResponse, IngredientUpdateDBRequest},
};
use crate::types::{IngredientId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing ingredients
#[derive(Debug, Clone, Default)]
pub struct IngredientFilter {
    /// Case-insensitive name prefix
    pub name: Option<String>,
}

pub struct Ingredients<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Ingredients<'c> {
    type CreateRequest = IngredientCreateDBRequest;
    type UpdateRequest = IngredientUpdateDBRequest;
    type Response = IngredientDBResponse;
    type Id = IngredientId;
    type Filter = IngredientFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let ingredient = sqlx::query_as::<_, IngredientDBResponse>(
            "INSERT INTO ingredients (id, name, measurement_unit) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.measurement_unit)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(ingredient)
    }

    #[instrument(skip(self), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let ingredient = sqlx::query_as::<_, IngredientDBResponse>("SELECT * FROM ingredients WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(ingredient)
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let ingredients = match &filter.name {
            Some(prefix) => {
                // Escape LIKE metacharacters so a literal "%" in the query
                // cannot widen the match
                let escaped = prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
                sqlx::query_as::<_, IngredientDBResponse>(
                    "SELECT * FROM ingredients WHERE name ILIKE $1 ORDER BY name",
                )
                .bind(format!("{escaped}%"))
                .fetch_all(&mut *self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, IngredientDBResponse>("SELECT * FROM ingredients ORDER BY name")
                    .fetch_all(&mut *self.db)
                    .await?
            }
        };

        Ok(ingredients)
    }

    #[instrument(skip(self), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM ingredients WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(ingredient_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let ingredient = sqlx::query_as::<_, IngredientDBResponse>(
            r#"
            UPDATE ingredients SET
                name = COALESCE($2, name),
                measurement_unit = COALESCE($3, measurement_unit)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.measurement_unit)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(ingredient)
    }
}

impl<'c> Ingredients<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
