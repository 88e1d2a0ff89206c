//! Database repository for tags.
//!
//! Tags are administrator-maintained reference data: the public API only ever
//! reads them, so the repository is small and the list is unpaginated.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::tags::{TagCreateDBRequest, TagDBResponse, TagUpdateDBRequest},
};
use crate::types::{TagId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Tags<'c> {
    db: &'c mut PgConnection,
}

#[async_trait::async_trait]
impl<'c> Repository for Tags<'c> {
    type CreateRequest = TagCreateDBRequest;
    type UpdateRequest = TagUpdateDBRequest;
    type Response = TagDBResponse;
    type Id = TagId;
    type Filter = ();

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let tag = sqlx::query_as::<_, TagDBResponse>(
            "INSERT INTO tags (id, name, color, slug) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&request.name)
        .bind(&request.color)
        .bind(&request.slug)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(tag)
    }

    #[instrument(skip(self), fields(tag_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let tag = sqlx::query_as::<_, TagDBResponse>("SELECT * FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(tag)
    }

    #[instrument(skip_all, err)]
    async fn list(&mut self, _filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tags = sqlx::query_as::<_, TagDBResponse>("SELECT * FROM tags ORDER BY name")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(tags)
    }

    #[instrument(skip(self), fields(tag_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(tag_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let tag = sqlx::query_as::<_, TagDBResponse>(
            r#"
            UPDATE tags SET
                name = COALESCE($2, name),
                color = COALESCE($3, color),
                slug = COALESCE($4, slug)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.color)
        .bind(&request.slug)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(tag)
    }
}

impl<'c> Tags<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}
