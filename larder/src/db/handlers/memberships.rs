//! Database repositories for the membership relations: favorites, shopping
//! carts and author subscriptions.
//!
//! All three share one state machine with two states per (actor, target)
//! pair: absent and present. `add` inserts the pair and lets the unique
//! index reject a duplicate - the resulting [`DbError::UniqueViolation`] is
//! what makes concurrent double-adds safe, the caller's pre-check only
//! phrases the error message. `remove` deletes the pair and reports
//! [`DbError::NotFound`] when no row was present.

use crate::db::errors::{DbError, Result};
use crate::db::models::users::UserDBResponse;
use crate::types::{RecipeId, UserId, abbrev_uuid};
use sqlx::PgConnection;
use tracing::instrument;

pub struct Favorites<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Favorites<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn exists(&mut self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM favorites WHERE user_id = $1 AND recipe_id = $2)",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn add(&mut self, user_id: UserId, recipe_id: RecipeId) -> Result<()> {
        match sqlx::query("INSERT INTO favorites (user_id, recipe_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&mut *self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
                // Foreign key violation means either user or recipe doesn't exist
                Err(DbError::NotFound)
            }
            Err(e) => Err(DbError::from(e)),
        }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn remove(&mut self, user_id: UserId, recipe_id: RecipeId) -> Result<()> {
        let result = sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() > 0 { Ok(()) } else { Err(DbError::NotFound) }
    }
}

pub struct ShoppingCarts<'c> {
    db: &'c mut PgConnection,
}

impl<'c> ShoppingCarts<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn exists(&mut self, user_id: UserId, recipe_id: RecipeId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM shopping_carts WHERE user_id = $1 AND recipe_id = $2)",
        )
        .bind(user_id)
        .bind(recipe_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn add(&mut self, user_id: UserId, recipe_id: RecipeId) -> Result<()> {
        match sqlx::query("INSERT INTO shopping_carts (user_id, recipe_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&mut *self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Err(DbError::NotFound),
            Err(e) => Err(DbError::from(e)),
        }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), recipe_id = %abbrev_uuid(&recipe_id)), err)]
    pub async fn remove(&mut self, user_id: UserId, recipe_id: RecipeId) -> Result<()> {
        let result = sqlx::query("DELETE FROM shopping_carts WHERE user_id = $1 AND recipe_id = $2")
            .bind(user_id)
            .bind(recipe_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() > 0 { Ok(()) } else { Err(DbError::NotFound) }
    }
}

pub struct Subscriptions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Subscriptions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), author_id = %abbrev_uuid(&author_id)), err)]
    pub async fn exists(&mut self, user_id: UserId, author_id: UserId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND author_id = $2)",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), author_id = %abbrev_uuid(&author_id)), err)]
    pub async fn add(&mut self, user_id: UserId, author_id: UserId) -> Result<()> {
        match sqlx::query("INSERT INTO subscriptions (user_id, author_id) VALUES ($1, $2)")
            .bind(user_id)
            .bind(author_id)
            .execute(&mut *self.db)
            .await
        {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => Err(DbError::NotFound),
            Err(e) => Err(DbError::from(e)),
        }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), author_id = %abbrev_uuid(&author_id)), err)]
    pub async fn remove(&mut self, user_id: UserId, author_id: UserId) -> Result<()> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND author_id = $2")
            .bind(user_id)
            .bind(author_id)
            .execute(&mut *self.db)
            .await?;
        if result.rows_affected() > 0 { Ok(()) } else { Err(DbError::NotFound) }
    }

    /// Of the given author ids, the ones this user is subscribed to
    #[instrument(skip(self, author_ids), fields(user_id = %abbrev_uuid(&user_id), count = author_ids.len()), err)]
    pub async fn filter_subscribed(&mut self, user_id: UserId, author_ids: &[UserId]) -> Result<Vec<UserId>> {
        let subscribed = sqlx::query_scalar::<_, UserId>(
            "SELECT author_id FROM subscriptions WHERE user_id = $1 AND author_id = ANY($2)",
        )
        .bind(user_id)
        .bind(author_ids)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(subscribed)
    }

    /// Authors the user is subscribed to, oldest subscription first
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn list_authors(&mut self, user_id: UserId, skip: i64, limit: i64) -> Result<Vec<UserDBResponse>> {
        let authors = sqlx::query_as::<_, UserDBResponse>(
            r#"
            SELECT u.*
            FROM users u
            INNER JOIN subscriptions s ON s.author_id = u.id
            WHERE s.user_id = $1
            ORDER BY s.created_at
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(authors)
    }
}
