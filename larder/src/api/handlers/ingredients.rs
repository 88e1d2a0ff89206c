use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        ingredients::{IngredientCreate, IngredientResponse, ListIngredientsQuery},
        users::CurrentUser,
    },
    auth::permissions::ensure_admin,
    db::handlers::{Ingredients, Repository, ingredients::IngredientFilter},
    errors::{Error, Result},
    types::{IngredientId, Operation, Resource},
};

#[utoipa::path(
    get,
    path = "/ingredients",
    tag = "ingredients",
    summary = "List ingredients",
    params(ListIngredientsQuery),
    responses(
        (status = 200, description = "List of ingredients", body = Vec<IngredientResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(query): Query<ListIngredientsQuery>,
) -> Result<Json<Vec<IngredientResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let ingredients = Ingredients::new(&mut conn).list(&IngredientFilter { name: query.name }).await?;
    Ok(Json(ingredients.into_iter().map(IngredientResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/ingredients/{id}",
    tag = "ingredients",
    summary = "Get an ingredient",
    params(("id" = uuid::Uuid, Path, description = "Ingredient ID")),
    responses(
        (status = 200, description = "Ingredient", body = IngredientResponse),
        (status = 404, description = "Ingredient not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_ingredient(State(state): State<AppState>, Path(id): Path<IngredientId>) -> Result<Json<IngredientResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let ingredient = Ingredients::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Ingredient".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(IngredientResponse::from(ingredient)))
}

#[utoipa::path(
    post,
    path = "/ingredients",
    tag = "ingredients",
    summary = "Create an ingredient (admin only)",
    request_body = IngredientCreate,
    responses(
        (status = 201, description = "Ingredient created", body = IngredientResponse),
        (status = 400, description = "Invalid ingredient"),
        (status = 403, description = "Not an administrator"),
        (status = 409, description = "Name already in use")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<IngredientCreate>,
) -> Result<(StatusCode, Json<IngredientResponse>)> {
    ensure_admin(&user, Resource::Ingredients, Operation::Create)?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let ingredient = Ingredients::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(IngredientResponse::from(ingredient))))
}
