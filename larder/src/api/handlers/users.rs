use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    api::models::{
        recipes::RecipeSummaryResponse,
        users::{CurrentUser, ListSubscriptionsQuery, ListUsersQuery, SubscribeQuery, SubscriptionResponse, UserResponse},
    },
    auth::current_user::MaybeUser,
    db::{
        handlers::{Recipes, Repository, Subscriptions, Users, users::UserFilter},
        models::users::UserDBResponse,
    },
    errors::{Error, Result},
    types::UserId,
};

/// Build the author-summary view for one subscribed-to author
async fn subscription_entry(
    conn: &mut sqlx::PgConnection,
    author: UserDBResponse,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionResponse> {
    let mut recipes_repo = Recipes::new(conn);
    let recipes_count = recipes_repo.count_by_author(author.id).await?;
    let recipes = recipes_repo.summaries_by_author(author.id, recipes_limit).await?;

    Ok(SubscriptionResponse {
        id: author.id,
        email: author.email,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed: true,
        recipes: recipes.into_iter().map(RecipeSummaryResponse::from).collect(),
        recipes_count,
    })
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 500, description = "Internal server error")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
    viewer: MaybeUser,
) -> Result<Json<Vec<UserResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let users = Users::new(&mut conn).list(&UserFilter::new(skip, limit)).await?;

    // One batch query for the viewer's subscription flags
    let subscribed: std::collections::HashSet<UserId> = match viewer.id() {
        Some(viewer_id) => {
            let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
            Subscriptions::new(&mut conn)
                .filter_subscribed(viewer_id, &ids)
                .await?
                .into_iter()
                .collect()
        }
        None => Default::default(),
    };

    Ok(Json(
        users
            .into_iter()
            .map(|user| {
                let is_subscribed = subscribed.contains(&user.id);
                UserResponse::from(user).with_subscribed(is_subscribed)
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/users/me",
    tag = "users",
    summary = "Get the current user's profile",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let stored = Users::new(&mut conn).get_by_id(user.id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user.id.to_string(),
    })?;

    Ok(Json(UserResponse::from(stored)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get a user profile",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User profile", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<UserId>, viewer: MaybeUser) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let user = Users::new(&mut conn).get_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: id.to_string(),
    })?;

    let is_subscribed = match viewer.id() {
        Some(viewer_id) => Subscriptions::new(&mut conn).exists(viewer_id, id).await?,
        None => false,
    };

    Ok(Json(UserResponse::from(user).with_subscribed(is_subscribed)))
}

#[utoipa::path(
    get,
    path = "/users/subscriptions",
    tag = "users",
    summary = "List the authors the current user is subscribed to",
    params(ListSubscriptionsQuery),
    responses(
        (status = 200, description = "Subscribed authors with recipe previews", body = Vec<SubscriptionResponse>),
        (status = 401, description = "Unauthorized")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(query): Query<ListSubscriptionsQuery>,
    user: CurrentUser,
) -> Result<Json<Vec<SubscriptionResponse>>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let (skip, limit) = query.pagination.params();
    let authors = Subscriptions::new(&mut conn).list_authors(user.id, skip, limit).await?;

    let mut entries = Vec::with_capacity(authors.len());
    for author in authors {
        entries.push(subscription_entry(&mut conn, author, query.recipes_limit).await?);
    }

    Ok(Json(entries))
}

#[utoipa::path(
    post,
    path = "/users/{id}/subscribe",
    tag = "users",
    summary = "Subscribe to an author",
    params(
        ("id" = uuid::Uuid, Path, description = "Author ID"),
        SubscribeQuery
    ),
    responses(
        (status = 201, description = "Subscribed", body = SubscriptionResponse),
        (status = 400, description = "Self-subscription"),
        (status = 404, description = "Author not found"),
        (status = 409, description = "Already subscribed")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn subscribe(
    State(state): State<AppState>,
    Path(author_id): Path<UserId>,
    Query(query): Query<SubscribeQuery>,
    user: CurrentUser,
) -> Result<(StatusCode, Json<SubscriptionResponse>)> {
    // Self-subscription is a validation failure regardless of prior state
    if author_id == user.id {
        return Err(Error::Validation {
            field: "author".to_string(),
            message: "You cannot subscribe to yourself".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let author = Users::new(&mut conn).get_by_id(author_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: author_id.to_string(),
    })?;

    // Pre-check only phrases the message; the unique index is the actual
    // guard if two adds race
    let mut subscriptions = Subscriptions::new(&mut conn);
    if subscriptions.exists(user.id, author_id).await? {
        return Err(Error::Conflict {
            message: "Already subscribed to this author".to_string(),
        });
    }
    subscriptions.add(user.id, author_id).await?;

    let entry = subscription_entry(&mut conn, author, query.recipes_limit).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[utoipa::path(
    delete,
    path = "/users/{id}/subscribe",
    tag = "users",
    summary = "Unsubscribe from an author",
    params(("id" = uuid::Uuid, Path, description = "Author ID")),
    responses(
        (status = 204, description = "Unsubscribed"),
        (status = 404, description = "Not subscribed")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn unsubscribe(State(state): State<AppState>, Path(author_id): Path<UserId>, user: CurrentUser) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    Subscriptions::new(&mut conn)
        .remove(user.id, author_id)
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => Error::NotFound {
                resource: "Subscription".to_string(),
                id: author_id.to_string(),
            },
            other => Error::Database(other),
        })?;

    Ok(StatusCode::NO_CONTENT)
}
