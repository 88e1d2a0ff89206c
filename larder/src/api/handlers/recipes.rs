use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    AppState,
    api::models::{
        recipes::{ListRecipesQuery, RecipeResponse, RecipeSummaryResponse, RecipeWrite},
        users::CurrentUser,
    },
    auth::{current_user::MaybeUser, permissions::ensure_can_modify_recipe},
    db::{
        errors::DbError,
        handlers::{Favorites, Recipes, ShoppingCarts, Subscriptions, recipes::RecipeFilter},
        models::recipes::{RecipeCreateDBRequest, RecipeDBResponse, RecipeUpdateDBRequest},
    },
    errors::{Error, Result},
    media,
    types::{Operation, RecipeId, UserId},
};

/// Convert assembled aggregates into API views, deriving the per-viewer
/// `is_subscribed` flag of each embedded author in one batch
async fn into_responses(
    conn: &mut sqlx::PgConnection,
    viewer: Option<UserId>,
    recipes: Vec<RecipeDBResponse>,
) -> Result<Vec<RecipeResponse>> {
    let subscribed: std::collections::HashSet<UserId> = match viewer {
        Some(viewer_id) => {
            let author_ids: Vec<UserId> = recipes.iter().map(|r| r.author.id).collect();
            Subscriptions::new(conn)
                .filter_subscribed(viewer_id, &author_ids)
                .await?
                .into_iter()
                .collect()
        }
        None => Default::default(),
    };

    Ok(recipes
        .into_iter()
        .map(|recipe| {
            let author_subscribed = subscribed.contains(&recipe.author.id);
            RecipeResponse::from(recipe).with_author_subscribed(author_subscribed)
        })
        .collect())
}

/// Resolve the recipe's author, or 404
async fn author_of(conn: &mut sqlx::PgConnection, id: RecipeId) -> Result<UserId> {
    let recipe = Recipes::new(conn).get_for_viewer(id, None).await?.ok_or_else(|| Error::NotFound {
        resource: "Recipe".to_string(),
        id: id.to_string(),
    })?;
    Ok(recipe.author.id)
}

#[utoipa::path(
    get,
    path = "/recipes",
    tag = "recipes",
    summary = "List recipes",
    params(ListRecipesQuery),
    responses(
        (status = 200, description = "List of recipes", body = Vec<RecipeResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(query): Query<ListRecipesQuery>,
    viewer: MaybeUser,
) -> Result<Json<Vec<RecipeResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    // The favorited/in-cart filters are viewer-scoped; for anonymous
    // requests they have nothing to refer to and are ignored
    let filter = RecipeFilter {
        author: query.author,
        tag_slugs: query.tag_slugs(),
        favorited_by: if query.is_favorited == Some(1) { viewer.id() } else { None },
        in_cart_of: if query.is_in_shopping_cart == Some(1) { viewer.id() } else { None },
        skip,
        limit,
    };

    let recipes = Recipes::new(&mut conn).list_for_viewer(&filter, viewer.id()).await?;
    let responses = into_responses(&mut conn, viewer.id(), recipes).await?;

    Ok(Json(responses))
}

#[utoipa::path(
    get,
    path = "/recipes/{id}",
    tag = "recipes",
    summary = "Get a recipe",
    params(("id" = uuid::Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 200, description = "Recipe", body = RecipeResponse),
        (status = 404, description = "Recipe not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_recipe(State(state): State<AppState>, Path(id): Path<RecipeId>, viewer: MaybeUser) -> Result<Json<RecipeResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let recipe = Recipes::new(&mut conn)
        .get_for_viewer(id, viewer.id())
        .await?
        .ok_or_else(|| Error::NotFound {
            resource: "Recipe".to_string(),
            id: id.to_string(),
        })?;

    let mut responses = into_responses(&mut conn, viewer.id(), vec![recipe]).await?;
    Ok(Json(responses.remove(0)))
}

#[utoipa::path(
    post,
    path = "/recipes",
    tag = "recipes",
    summary = "Create a recipe",
    request_body = RecipeWrite,
    responses(
        (status = 201, description = "Recipe created", body = RecipeResponse),
        (status = 400, description = "Validation failure"),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<RecipeWrite>,
) -> Result<(StatusCode, Json<RecipeResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut recipes = Recipes::new(&mut conn);

    // Duplicate-submission rule: identical (name, text) is rejected. This is
    // an application-level check without a backing constraint, so two
    // perfectly simultaneous identical creates can both pass.
    if recipes.exists_with_name_text(&request.name, &request.text, None).await? {
        return Err(Error::Validation {
            field: "name".to_string(),
            message: "A recipe with the same name and text already exists".to_string(),
        });
    }

    let image = match &request.image {
        Some(data_url) => Some(media::store_base64_image(data_url, &state.config.media_root).await?),
        None => None,
    };

    let created = recipes
        .create(&RecipeCreateDBRequest {
            author_id: user.id,
            name: request.name.clone(),
            text: request.text.clone(),
            image,
            cooking_time: request.cooking_time,
            tag_ids: request.tags.clone(),
            ingredients: request.ingredient_amounts(),
        })
        .await
        .map_err(|e| match e {
            // An unknown tag or ingredient id surfaces as a bad reference
            DbError::ForeignKeyViolation { .. } => Error::BadRequest {
                message: "Unknown tag or ingredient id".to_string(),
            },
            other => Error::Database(other),
        })?;

    let mut responses = into_responses(&mut conn, Some(user.id), vec![created]).await?;
    Ok((StatusCode::CREATED, Json(responses.remove(0))))
}

#[utoipa::path(
    patch,
    path = "/recipes/{id}",
    tag = "recipes",
    summary = "Update a recipe (full replace of tag and ingredient sets)",
    params(("id" = uuid::Uuid, Path, description = "Recipe ID")),
    request_body = RecipeWrite,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Not the author or an administrator"),
        (status = 404, description = "Recipe not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_recipe(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
    user: CurrentUser,
    Json(request): Json<RecipeWrite>,
) -> Result<Json<RecipeResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let author_id = author_of(&mut conn, id).await?;
    ensure_can_modify_recipe(&user, author_id, Operation::Update)?;

    request.validate()?;

    let mut recipes = Recipes::new(&mut conn);
    if recipes.exists_with_name_text(&request.name, &request.text, Some(id)).await? {
        return Err(Error::Validation {
            field: "name".to_string(),
            message: "A recipe with the same name and text already exists".to_string(),
        });
    }

    // Omitted image keeps the stored one
    let image = match &request.image {
        Some(data_url) => Some(media::store_base64_image(data_url, &state.config.media_root).await?),
        None => None,
    };

    let updated = recipes
        .update(
            id,
            &RecipeUpdateDBRequest {
                name: request.name.clone(),
                text: request.text.clone(),
                image,
                cooking_time: request.cooking_time,
                tag_ids: request.tags.clone(),
                ingredients: request.ingredient_amounts(),
            },
        )
        .await
        .map_err(|e| match e {
            DbError::ForeignKeyViolation { .. } => Error::BadRequest {
                message: "Unknown tag or ingredient id".to_string(),
            },
            other => Error::Database(other),
        })?;

    let mut responses = into_responses(&mut conn, Some(user.id), vec![updated]).await?;
    Ok(Json(responses.remove(0)))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}",
    tag = "recipes",
    summary = "Delete a recipe",
    params(("id" = uuid::Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 403, description = "Not the author or an administrator"),
        (status = 404, description = "Recipe not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_recipe(State(state): State<AppState>, Path(id): Path<RecipeId>, user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let author_id = author_of(&mut conn, id).await?;
    ensure_can_modify_recipe(&user, author_id, Operation::Delete)?;

    Recipes::new(&mut conn).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Look up the summary form, or 404
async fn summary_of(conn: &mut sqlx::PgConnection, id: RecipeId) -> Result<RecipeSummaryResponse> {
    let summary = Recipes::new(conn).summary_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Recipe".to_string(),
        id: id.to_string(),
    })?;
    Ok(RecipeSummaryResponse::from(summary))
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/favorite",
    tag = "recipes",
    summary = "Add a recipe to favorites",
    params(("id" = uuid::Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to favorites", body = RecipeSummaryResponse),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already in favorites")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_favorite(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<RecipeSummaryResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let summary = summary_of(&mut conn, id).await?;

    let mut favorites = Favorites::new(&mut conn);
    if favorites.exists(user.id, id).await? {
        return Err(Error::Conflict {
            message: "Recipe is already in favorites".to_string(),
        });
    }
    favorites.add(user.id, id).await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/favorite",
    tag = "recipes",
    summary = "Remove a recipe from favorites",
    params(("id" = uuid::Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from favorites"),
        (status = 404, description = "Not in favorites")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn remove_favorite(State(state): State<AppState>, Path(id): Path<RecipeId>, user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Favorites::new(&mut conn).remove(user.id, id).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Favorite".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/recipes/{id}/shopping-cart",
    tag = "recipes",
    summary = "Add a recipe to the shopping cart",
    params(("id" = uuid::Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 201, description = "Added to the cart", body = RecipeSummaryResponse),
        (status = 404, description = "Recipe not found"),
        (status = 409, description = "Already in the cart")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    Path(id): Path<RecipeId>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<RecipeSummaryResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let summary = summary_of(&mut conn, id).await?;

    let mut carts = ShoppingCarts::new(&mut conn);
    if carts.exists(user.id, id).await? {
        return Err(Error::Conflict {
            message: "Recipe is already in the shopping cart".to_string(),
        });
    }
    carts.add(user.id, id).await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

#[utoipa::path(
    delete,
    path = "/recipes/{id}/shopping-cart",
    tag = "recipes",
    summary = "Remove a recipe from the shopping cart",
    params(("id" = uuid::Uuid, Path, description = "Recipe ID")),
    responses(
        (status = 204, description = "Removed from the cart"),
        (status = 404, description = "Not in the cart")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn remove_from_cart(State(state): State<AppState>, Path(id): Path<RecipeId>, user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    ShoppingCarts::new(&mut conn).remove(user.id, id).await.map_err(|e| match e {
        DbError::NotFound => Error::NotFound {
            resource: "Shopping cart entry".to_string(),
            id: id.to_string(),
        },
        other => Error::Database(other),
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Render the aggregated cart as the downloadable plain-text file
fn render_shopping_list(items: &[crate::db::models::recipes::ShoppingListItem]) -> String {
    let mut body = String::from("Shopping list:\n");
    for item in items {
        body.push_str(&format!("\n{} - {}, {}", item.name, item.total_amount, item.measurement_unit));
    }
    body
}

#[utoipa::path(
    get,
    path = "/recipes/download-shopping-cart",
    tag = "recipes",
    summary = "Download the aggregated shopping list as a text file",
    responses(
        (status = 200, description = "Plain-text shopping list"),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn download_shopping_cart(State(state): State<AppState>, user: CurrentUser) -> Result<Response> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    // An empty cart is not an error: the file is just the header line
    let items = Recipes::new(&mut conn).shopping_list(user.id).await?;
    let body = render_shopping_list(&items);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"shopping_cart.txt\""),
        ],
        body,
    )
        .into_response())
}
