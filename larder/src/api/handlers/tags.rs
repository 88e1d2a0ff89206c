use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        tags::{TagCreate, TagResponse},
        users::CurrentUser,
    },
    auth::permissions::ensure_admin,
    db::handlers::{Repository, Tags},
    errors::{Error, Result},
    types::{Operation, Resource, TagId},
};

#[utoipa::path(
    get,
    path = "/tags",
    tag = "tags",
    summary = "List tags",
    responses(
        (status = 200, description = "List of tags", body = Vec<TagResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<TagResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let tags = Tags::new(&mut conn).list(&()).await?;
    Ok(Json(tags.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/tags/{id}",
    tag = "tags",
    summary = "Get a tag",
    params(("id" = uuid::Uuid, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag", body = TagResponse),
        (status = 404, description = "Tag not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_tag(State(state): State<AppState>, Path(id): Path<TagId>) -> Result<Json<TagResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let tag = Tags::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "Tag".to_string(),
        id: id.to_string(),
    })?;

    Ok(Json(TagResponse::from(tag)))
}

#[utoipa::path(
    post,
    path = "/tags",
    tag = "tags",
    summary = "Create a tag (admin only)",
    request_body = TagCreate,
    responses(
        (status = 201, description = "Tag created", body = TagResponse),
        (status = 400, description = "Invalid tag"),
        (status = 403, description = "Not an administrator"),
        (status = 409, description = "Name, color or slug already in use")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_tag(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<TagCreate>,
) -> Result<(StatusCode, Json<TagResponse>)> {
    ensure_admin(&user, Resource::Tags, Operation::Create)?;
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let tag = Tags::new(&mut conn).create(&request.into()).await?;
    Ok((StatusCode::CREATED, Json(TagResponse::from(tag))))
}
