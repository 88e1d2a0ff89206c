//! OpenAPI documentation configuration.
//!
//! The generated spec is served at `/api-docs/openapi.json`, with the Scalar
//! UI mounted at `/docs`.

use utoipa::OpenApi;

use crate::api::models::{
    auth::{AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest},
    ingredients::{IngredientCreate, IngredientResponse},
    recipes::{IngredientEntry, RecipeIngredientResponse, RecipeResponse, RecipeSummaryResponse, RecipeWrite},
    tags::{TagCreate, TagResponse},
    users::{SubscriptionResponse, UserResponse},
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Larder API",
        description = "Recipe sharing platform: recipes with tags and ingredient amounts, favorites, shopping carts with an aggregated downloadable list, and author subscriptions."
    ),
    paths(
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::change_password,
        crate::api::handlers::users::list_users,
        crate::api::handlers::users::me,
        crate::api::handlers::users::get_user,
        crate::api::handlers::users::list_subscriptions,
        crate::api::handlers::users::subscribe,
        crate::api::handlers::users::unsubscribe,
        crate::api::handlers::tags::list_tags,
        crate::api::handlers::tags::get_tag,
        crate::api::handlers::tags::create_tag,
        crate::api::handlers::ingredients::list_ingredients,
        crate::api::handlers::ingredients::get_ingredient,
        crate::api::handlers::ingredients::create_ingredient,
        crate::api::handlers::recipes::list_recipes,
        crate::api::handlers::recipes::get_recipe,
        crate::api::handlers::recipes::create_recipe,
        crate::api::handlers::recipes::update_recipe,
        crate::api::handlers::recipes::delete_recipe,
        crate::api::handlers::recipes::add_favorite,
        crate::api::handlers::recipes::remove_favorite,
        crate::api::handlers::recipes::add_to_cart,
        crate::api::handlers::recipes::remove_from_cart,
        crate::api::handlers::recipes::download_shopping_cart,
    ),
    components(schemas(
        AuthResponse,
        ChangePasswordRequest,
        LoginRequest,
        RegisterRequest,
        UserResponse,
        SubscriptionResponse,
        TagCreate,
        TagResponse,
        IngredientCreate,
        IngredientResponse,
        RecipeWrite,
        IngredientEntry,
        RecipeResponse,
        RecipeIngredientResponse,
        RecipeSummaryResponse,
    ))
)]
pub struct ApiDoc;
