//! Database repository for the recipe aggregate.
//!
//! A recipe is persisted together with its tag set and its
//! ingredient-with-amount set: create and update write all three in one
//! transaction, so concurrent readers never observe a recipe whose
//! associations are missing or half-replaced. Update is always a full
//! replace of both sets.
//!
//! Reads assemble the aggregate (author, tags, ingredient lines) and derive
//! `is_favorited` / `is_in_shopping_cart` for the requesting viewer. The
//! recipe table's stored columns of the same names are intentionally never
//! selected here.

use std::collections::{HashMap, HashSet};

use crate::db::{
    errors::{DbError, Result},
    models::{
        recipes::{
            RecipeCreateDBRequest, RecipeDBResponse, RecipeIngredientDBResponse, RecipeSummaryDBResponse,
            RecipeUpdateDBRequest, ShoppingListItem,
        },
        tags::TagDBResponse,
        users::UserDBResponse,
    },
};
use crate::types::{RecipeId, TagId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing recipes
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<UserId>,
    /// Tag slugs, OR semantics: a recipe matches when it carries any of them
    pub tag_slugs: Vec<String>,
    /// Only recipes favorited by this user
    pub favorited_by: Option<UserId>,
    /// Only recipes in this user's shopping cart
    pub in_cart_of: Option<UserId>,
    pub skip: i64,
    pub limit: i64,
}

// Base row of the aggregate; the legacy is_favorited/is_in_shopping_cart
// columns are deliberately not part of this projection
#[derive(Debug, Clone, FromRow)]
struct RecipeRow {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub image: Option<String>,
    pub cooking_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const RECIPE_COLUMNS: &str = "r.id, r.author_id, r.name, r.text, r.image, r.cooking_time, r.created_at, r.updated_at";

#[derive(FromRow)]
struct RecipeTagRow {
    recipe_id: RecipeId,
    #[sqlx(flatten)]
    tag: TagDBResponse,
}

#[derive(FromRow)]
struct RecipeIngredientRow {
    recipe_id: RecipeId,
    #[sqlx(flatten)]
    line: RecipeIngredientDBResponse,
}

pub struct Recipes<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Recipes<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Create the aggregate: recipe row, tag associations and ingredient
    /// associations are written in one transaction.
    #[instrument(skip(self, request), fields(name = %request.name), err)]
    pub async fn create(&mut self, request: &RecipeCreateDBRequest) -> Result<RecipeDBResponse> {
        let recipe_id = Uuid::new_v4();

        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO recipes (id, author_id, name, text, image, cooking_time)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(recipe_id)
        .bind(request.author_id)
        .bind(&request.name)
        .bind(&request.text)
        .bind(&request.image)
        .bind(request.cooking_time)
        .execute(&mut *tx)
        .await?;

        insert_tags(&mut tx, recipe_id, &request.tag_ids).await?;
        insert_ingredients(&mut tx, recipe_id, &request.ingredients).await?;

        tx.commit().await?;

        let recipe = self.get_for_viewer(recipe_id, Some(request.author_id)).await?;
        recipe.ok_or(DbError::NotFound)
    }

    /// Replace the aggregate: base fields are updated and both association
    /// sets are cleared and rewritten, all in one transaction.
    #[instrument(skip(self, request), fields(recipe_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: RecipeId, request: &RecipeUpdateDBRequest) -> Result<RecipeDBResponse> {
        let author_id;
        {
            let mut tx = self.db.begin().await?;

            author_id = sqlx::query_scalar::<_, UserId>(
                r#"
                UPDATE recipes SET
                    name = $2,
                    text = $3,
                    image = COALESCE($4, image),
                    cooking_time = $5,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING author_id
                "#,
            )
            .bind(id)
            .bind(&request.name)
            .bind(&request.text)
            .bind(&request.image)
            .bind(request.cooking_time)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

            sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            insert_tags(&mut tx, id, &request.tag_ids).await?;
            insert_ingredients(&mut tx, id, &request.ingredients).await?;

            tx.commit().await?;
        }

        let recipe = self.get_for_viewer(id, Some(author_id)).await?;
        recipe.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: RecipeId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    /// Fetch one assembled recipe with viewer-derived membership booleans
    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&id)), err)]
    pub async fn get_for_viewer(&mut self, id: RecipeId, viewer: Option<UserId>) -> Result<Option<RecipeDBResponse>> {
        let row = sqlx::query_as::<_, RecipeRow>(&format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        match row {
            Some(row) => Ok(self.assemble(vec![row], viewer).await?.pop()),
            None => Ok(None),
        }
    }

    /// List assembled recipes, newest first
    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    pub async fn list_for_viewer(&mut self, filter: &RecipeFilter, viewer: Option<UserId>) -> Result<Vec<RecipeDBResponse>> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {RECIPE_COLUMNS} FROM recipes r WHERE TRUE"));

        if let Some(author) = filter.author {
            qb.push(" AND r.author_id = ").push_bind(author);
        }
        if !filter.tag_slugs.is_empty() {
            qb.push(" AND EXISTS (SELECT 1 FROM recipe_tags rt INNER JOIN tags t ON t.id = rt.tag_id WHERE rt.recipe_id = r.id AND t.slug = ANY(")
                .push_bind(filter.tag_slugs.clone())
                .push("))");
        }
        if let Some(user) = filter.favorited_by {
            qb.push(" AND EXISTS (SELECT 1 FROM favorites f WHERE f.recipe_id = r.id AND f.user_id = ")
                .push_bind(user)
                .push(")");
        }
        if let Some(user) = filter.in_cart_of {
            qb.push(" AND EXISTS (SELECT 1 FROM shopping_carts sc WHERE sc.recipe_id = r.id AND sc.user_id = ")
                .push_bind(user)
                .push(")");
        }

        qb.push(" ORDER BY r.created_at DESC LIMIT ")
            .push_bind(filter.limit)
            .push(" OFFSET ")
            .push_bind(filter.skip);

        let rows = qb.build_query_as::<RecipeRow>().fetch_all(&mut *self.db).await?;

        self.assemble(rows, viewer).await
    }

    /// Whether a recipe with this exact (name, text) pair already exists.
    ///
    /// Backs the duplicate-submission rule. There is deliberately no unique
    /// index behind it, matching the original system: the check is racy under
    /// concurrent identical creates.
    #[instrument(skip(self, name, text), err)]
    pub async fn exists_with_name_text(&mut self, name: &str, text: &str, exclude: Option<RecipeId>) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM recipes WHERE name = $1 AND text = $2 AND ($3::uuid IS NULL OR id <> $3))",
        )
        .bind(name)
        .bind(text)
        .bind(exclude)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(exists)
    }

    /// Short form for membership responses
    #[instrument(skip(self), fields(recipe_id = %abbrev_uuid(&id)), err)]
    pub async fn summary_by_id(&mut self, id: RecipeId) -> Result<Option<RecipeSummaryDBResponse>> {
        let summary = sqlx::query_as::<_, RecipeSummaryDBResponse>(
            "SELECT id, name, image, cooking_time FROM recipes WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(summary)
    }

    /// Preview recipes of an author, newest first, optionally capped
    #[instrument(skip(self), fields(author_id = %abbrev_uuid(&author_id)), err)]
    pub async fn summaries_by_author(&mut self, author_id: UserId, limit: Option<i64>) -> Result<Vec<RecipeSummaryDBResponse>> {
        let summaries = sqlx::query_as::<_, RecipeSummaryDBResponse>(
            r#"
            SELECT id, name, image, cooking_time FROM recipes
            WHERE author_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(author_id)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(summaries)
    }

    #[instrument(skip(self), fields(author_id = %abbrev_uuid(&author_id)), err)]
    pub async fn count_by_author(&mut self, author_id: UserId) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(count)
    }

    /// Aggregate the user's shopping cart: every ingredient line of every
    /// carted recipe, summed per (name, measurement unit). The unit is part
    /// of the grouping key - "200 g" and "200 ml" of the same name stay
    /// separate lines.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn shopping_list(&mut self, user_id: UserId) -> Result<Vec<ShoppingListItem>> {
        let items = sqlx::query_as::<_, ShoppingListItem>(
            r#"
            SELECT i.name, i.measurement_unit, SUM(ri.amount) AS total_amount
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            INNER JOIN shopping_carts sc ON sc.recipe_id = ri.recipe_id
            WHERE sc.user_id = $1
            GROUP BY i.name, i.measurement_unit
            ORDER BY i.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(items)
    }

    /// Assemble aggregate responses for a page of base rows: authors, tag
    /// sets, ingredient lines and the viewer-derived booleans, fetched as one
    /// batch per relation.
    async fn assemble(&mut self, rows: Vec<RecipeRow>, viewer: Option<UserId>) -> Result<Vec<RecipeDBResponse>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let recipe_ids: Vec<RecipeId> = rows.iter().map(|r| r.id).collect();
        let author_ids: Vec<UserId> = rows.iter().map(|r| r.author_id).collect();

        let authors: HashMap<UserId, UserDBResponse> =
            sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = ANY($1)")
                .bind(&author_ids)
                .fetch_all(&mut *self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect();

        let mut tags_by_recipe: HashMap<RecipeId, Vec<TagDBResponse>> = HashMap::new();
        let tag_rows = sqlx::query_as::<_, RecipeTagRow>(
            r#"
            SELECT rt.recipe_id, t.id, t.name, t.color, t.slug
            FROM recipe_tags rt
            INNER JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&recipe_ids)
        .fetch_all(&mut *self.db)
        .await?;
        for row in tag_rows {
            tags_by_recipe.entry(row.recipe_id).or_default().push(row.tag);
        }

        let mut ingredients_by_recipe: HashMap<RecipeId, Vec<RecipeIngredientDBResponse>> = HashMap::new();
        let ingredient_rows = sqlx::query_as::<_, RecipeIngredientRow>(
            r#"
            SELECT ri.recipe_id, ri.ingredient_id, i.name, i.measurement_unit, ri.amount
            FROM recipe_ingredients ri
            INNER JOIN ingredients i ON i.id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY i.name
            "#,
        )
        .bind(&recipe_ids)
        .fetch_all(&mut *self.db)
        .await?;
        for row in ingredient_rows {
            ingredients_by_recipe.entry(row.recipe_id).or_default().push(row.line);
        }

        // Anonymous viewers get both booleans false, whatever is stored
        let (favorited, in_cart) = match viewer {
            Some(user_id) => {
                let favorited: HashSet<RecipeId> =
                    sqlx::query_scalar::<_, RecipeId>("SELECT recipe_id FROM favorites WHERE user_id = $1 AND recipe_id = ANY($2)")
                        .bind(user_id)
                        .bind(&recipe_ids)
                        .fetch_all(&mut *self.db)
                        .await?
                        .into_iter()
                        .collect();
                let in_cart: HashSet<RecipeId> =
                    sqlx::query_scalar::<_, RecipeId>("SELECT recipe_id FROM shopping_carts WHERE user_id = $1 AND recipe_id = ANY($2)")
                        .bind(user_id)
                        .bind(&recipe_ids)
                        .fetch_all(&mut *self.db)
                        .await?
                        .into_iter()
                        .collect();
                (favorited, in_cart)
            }
            None => (HashSet::new(), HashSet::new()),
        };

        let mut assembled = Vec::with_capacity(rows.len());
        for row in rows {
            let author = authors.get(&row.author_id).cloned().ok_or(DbError::NotFound)?;
            assembled.push(RecipeDBResponse {
                id: row.id,
                author,
                name: row.name,
                text: row.text,
                image: row.image,
                cooking_time: row.cooking_time,
                tags: tags_by_recipe.remove(&row.id).unwrap_or_default(),
                ingredients: ingredients_by_recipe.remove(&row.id).unwrap_or_default(),
                is_favorited: favorited.contains(&row.id),
                is_in_shopping_cart: in_cart.contains(&row.id),
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }

        Ok(assembled)
    }
}

async fn insert_tags(tx: &mut sqlx::Transaction<'_, Postgres>, recipe_id: RecipeId, tag_ids: &[TagId]) -> Result<()> {
    for tag_id in tag_ids {
        sqlx::query("INSERT INTO recipe_tags (recipe_id, tag_id) VALUES ($1, $2)")
            .bind(recipe_id)
            .bind(tag_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn insert_ingredients(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    recipe_id: RecipeId,
    ingredients: &[crate::db::models::recipes::IngredientAmount],
) -> Result<()> {
    if ingredients.is_empty() {
        return Ok(());
    }

    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    qb.push_values(ingredients, |mut b, entry| {
        b.push_bind(recipe_id).push_bind(entry.ingredient_id).push_bind(entry.amount);
    });
    qb.build().execute(&mut **tx).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::memberships::{Favorites, ShoppingCarts};
    use crate::db::handlers::repository::Repository;
    use crate::db::handlers::{Ingredients, Tags, Users};
    use crate::db::models::ingredients::IngredientCreateDBRequest;
    use crate::db::models::recipes::IngredientAmount;
    use crate::db::models::tags::TagCreateDBRequest;
    use crate::db::models::users::UserCreateDBRequest;
    use sqlx::PgPool;

    struct Fixture {
        author: UserDBResponse,
        breakfast: TagDBResponse,
        dinner: TagDBResponse,
        flour: crate::db::models::ingredients::IngredientDBResponse,
        sugar: crate::db::models::ingredients::IngredientDBResponse,
        milk: crate::db::models::ingredients::IngredientDBResponse,
    }

    async fn fixture(pool: &PgPool) -> Fixture {
        let mut conn = pool.acquire().await.unwrap();

        let author = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: "chef@example.com".to_string(),
                username: "chef".to_string(),
                first_name: "Julia".to_string(),
                last_name: "Child".to_string(),
                is_admin: false,
                password_hash: None,
            })
            .await
            .unwrap();

        let mut tags = Tags::new(&mut conn);
        let breakfast = tags
            .create(&TagCreateDBRequest {
                name: "breakfast".to_string(),
                color: "#FFAA00".to_string(),
                slug: "breakfast".to_string(),
            })
            .await
            .unwrap();
        let dinner = tags
            .create(&TagCreateDBRequest {
                name: "dinner".to_string(),
                color: "#0055FF".to_string(),
                slug: "dinner".to_string(),
            })
            .await
            .unwrap();

        let mut ingredients = Ingredients::new(&mut conn);
        let flour = ingredients
            .create(&IngredientCreateDBRequest {
                name: "flour".to_string(),
                measurement_unit: "g".to_string(),
            })
            .await
            .unwrap();
        let sugar = ingredients
            .create(&IngredientCreateDBRequest {
                name: "sugar".to_string(),
                measurement_unit: "g".to_string(),
            })
            .await
            .unwrap();
        let milk = ingredients
            .create(&IngredientCreateDBRequest {
                name: "milk".to_string(),
                measurement_unit: "ml".to_string(),
            })
            .await
            .unwrap();

        Fixture {
            author,
            breakfast,
            dinner,
            flour,
            sugar,
            milk,
        }
    }

    fn pancakes(f: &Fixture) -> RecipeCreateDBRequest {
        RecipeCreateDBRequest {
            author_id: f.author.id,
            name: "Pancakes".to_string(),
            text: "Mix and fry.".to_string(),
            image: None,
            cooking_time: 20,
            tag_ids: vec![f.breakfast.id],
            ingredients: vec![
                IngredientAmount {
                    ingredient_id: f.flour.id,
                    amount: 200,
                },
                IngredientAmount {
                    ingredient_id: f.sugar.id,
                    amount: 50,
                },
            ],
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_assembles_aggregate(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let recipe = repo.create(&pancakes(&f)).await.unwrap();

        assert_eq!(recipe.name, "Pancakes");
        assert_eq!(recipe.author.id, f.author.id);
        assert_eq!(recipe.tags.len(), 1);
        assert_eq!(recipe.tags[0].slug, "breakfast");
        assert_eq!(recipe.ingredients.len(), 2);
        // Ingredient lines are ordered by name
        assert_eq!(recipe.ingredients[0].name, "flour");
        assert_eq!(recipe.ingredients[0].amount, 200);
        assert_eq!(recipe.ingredients[1].name, "sugar");
        // The author has not favorited their own recipe
        assert!(!recipe.is_favorited);
        assert!(!recipe.is_in_shopping_cart);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_with_unknown_ingredient_persists_nothing(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let mut request = pancakes(&f);
        request.ingredients.push(IngredientAmount {
            ingredient_id: Uuid::new_v4(),
            amount: 10,
        });

        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));

        // The transaction rolled back: no recipe row, no partial associations
        let recipe_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipes").fetch_one(&pool).await.unwrap();
        assert_eq!(recipe_count, 0);
        let line_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipe_ingredients")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(line_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_fully_replaces_associations(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let created = repo.create(&pancakes(&f)).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &RecipeUpdateDBRequest {
                    name: "Crepes".to_string(),
                    text: "Mix thinner and fry.".to_string(),
                    image: None,
                    cooking_time: 15,
                    tag_ids: vec![f.dinner.id],
                    ingredients: vec![IngredientAmount {
                        ingredient_id: f.milk.id,
                        amount: 300,
                    }],
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Crepes");
        // No residue from the prior tag/ingredient sets
        assert_eq!(updated.tags.len(), 1);
        assert_eq!(updated.tags[0].slug, "dinner");
        assert_eq!(updated.ingredients.len(), 1);
        assert_eq!(updated.ingredients[0].name, "milk");
        assert_eq!(updated.ingredients[0].amount, 300);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_missing_recipe_is_not_found(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let err = repo
            .update(
                Uuid::new_v4(),
                &RecipeUpdateDBRequest {
                    name: "Ghost".to_string(),
                    text: "Boo.".to_string(),
                    image: None,
                    cooking_time: 5,
                    tag_ids: vec![f.breakfast.id],
                    ingredients: vec![IngredientAmount {
                        ingredient_id: f.flour.id,
                        amount: 1,
                    }],
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_viewer_membership_booleans(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let created = Recipes::new(&mut conn).create(&pancakes(&f)).await.unwrap();
        Favorites::new(&mut conn).add(f.author.id, created.id).await.unwrap();

        // Poison the stored columns; the derived values must still win
        sqlx::query("UPDATE recipes SET is_favorited = TRUE, is_in_shopping_cart = TRUE WHERE id = $1")
            .bind(created.id)
            .execute(&pool)
            .await
            .unwrap();

        let mut repo = Recipes::new(&mut conn);
        let seen_by_author = repo.get_for_viewer(created.id, Some(f.author.id)).await.unwrap().unwrap();
        assert!(seen_by_author.is_favorited);
        assert!(!seen_by_author.is_in_shopping_cart);

        let seen_anonymous = repo.get_for_viewer(created.id, None).await.unwrap().unwrap();
        assert!(!seen_anonymous.is_favorited);
        assert!(!seen_anonymous.is_in_shopping_cart);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let other_author = Users::new(&mut conn)
            .create(&UserCreateDBRequest {
                email: "other@example.com".to_string(),
                username: "other".to_string(),
                first_name: "Other".to_string(),
                last_name: "Cook".to_string(),
                is_admin: false,
                password_hash: None,
            })
            .await
            .unwrap();

        let mut repo = Recipes::new(&mut conn);
        let pancakes = repo.create(&pancakes(&f)).await.unwrap();
        let stew = repo
            .create(&RecipeCreateDBRequest {
                author_id: other_author.id,
                name: "Stew".to_string(),
                text: "Simmer.".to_string(),
                image: None,
                cooking_time: 90,
                tag_ids: vec![f.dinner.id],
                ingredients: vec![IngredientAmount {
                    ingredient_id: f.milk.id,
                    amount: 100,
                }],
            })
            .await
            .unwrap();

        Favorites::new(&mut conn).add(f.author.id, stew.id).await.unwrap();

        let mut repo = Recipes::new(&mut conn);
        let base = RecipeFilter {
            skip: 0,
            limit: 10,
            ..Default::default()
        };

        let all = repo.list_for_viewer(&base, None).await.unwrap();
        assert_eq!(all.len(), 2);

        let by_author = repo
            .list_for_viewer(
                &RecipeFilter {
                    author: Some(f.author.id),
                    ..base.clone()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(by_author.len(), 1);
        assert_eq!(by_author[0].id, pancakes.id);

        let by_tag = repo
            .list_for_viewer(
                &RecipeFilter {
                    tag_slugs: vec!["dinner".to_string()],
                    ..base.clone()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(by_tag.len(), 1);
        assert_eq!(by_tag[0].id, stew.id);

        let favorited = repo
            .list_for_viewer(
                &RecipeFilter {
                    favorited_by: Some(f.author.id),
                    ..base.clone()
                },
                Some(f.author.id),
            )
            .await
            .unwrap();
        assert_eq!(favorited.len(), 1);
        assert_eq!(favorited[0].id, stew.id);
        assert!(favorited[0].is_favorited);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_shopping_list_sums_per_name_and_unit(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let mut repo = Recipes::new(&mut conn);
        let recipe_a = repo.create(&pancakes(&f)).await.unwrap();
        let recipe_b = repo
            .create(&RecipeCreateDBRequest {
                author_id: f.author.id,
                name: "Bread".to_string(),
                text: "Knead and bake.".to_string(),
                image: None,
                cooking_time: 180,
                tag_ids: vec![f.dinner.id],
                ingredients: vec![IngredientAmount {
                    ingredient_id: f.flour.id,
                    amount: 100,
                }],
            })
            .await
            .unwrap();

        let mut carts = ShoppingCarts::new(&mut conn);
        carts.add(f.author.id, recipe_a.id).await.unwrap();
        carts.add(f.author.id, recipe_b.id).await.unwrap();

        let items = Recipes::new(&mut conn).shopping_list(f.author.id).await.unwrap();
        assert_eq!(
            items,
            vec![
                ShoppingListItem {
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 300,
                },
                ShoppingListItem {
                    name: "sugar".to_string(),
                    measurement_unit: "g".to_string(),
                    total_amount: 50,
                },
            ]
        );
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_shopping_list_empty_cart(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        let items = Recipes::new(&mut conn).shopping_list(f.author.id).await.unwrap();
        assert!(items.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_name_text_detection(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let created = repo.create(&pancakes(&f)).await.unwrap();

        assert!(repo.exists_with_name_text("Pancakes", "Mix and fry.", None).await.unwrap());
        // The recipe being updated does not conflict with itself
        assert!(!repo.exists_with_name_text("Pancakes", "Mix and fry.", Some(created.id)).await.unwrap());
        assert!(!repo.exists_with_name_text("Pancakes", "Different steps.", None).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_cascades_associations(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        let created = repo.create(&pancakes(&f)).await.unwrap();
        assert!(repo.delete(created.id).await.unwrap());

        let tag_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipe_tags").fetch_one(&pool).await.unwrap();
        let line_count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM recipe_ingredients")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(tag_count, 0);
        assert_eq!(line_count, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_author_summaries_and_count(pool: PgPool) {
        let f = fixture(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Recipes::new(&mut conn);

        repo.create(&pancakes(&f)).await.unwrap();
        repo.create(&RecipeCreateDBRequest {
            author_id: f.author.id,
            name: "Porridge".to_string(),
            text: "Boil.".to_string(),
            image: None,
            cooking_time: 10,
            tag_ids: vec![f.breakfast.id],
            ingredients: vec![IngredientAmount {
                ingredient_id: f.milk.id,
                amount: 250,
            }],
        })
        .await
        .unwrap();

        assert_eq!(repo.count_by_author(f.author.id).await.unwrap(), 2);
        assert_eq!(repo.summaries_by_author(f.author.id, None).await.unwrap().len(), 2);
        assert_eq!(repo.summaries_by_author(f.author.id, Some(1)).await.unwrap().len(), 1);
    }
}
