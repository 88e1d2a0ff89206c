//! # larder: Recipe Sharing Platform Backend
//!
//! `larder` is a self-hostable backend for sharing recipes. Users create
//! recipes carrying a tag set and an ingredient-with-amount set, favorite
//! recipes, subscribe to other authors, and collect recipes into a shopping
//! cart from which an aggregated, downloadable shopping list is produced.
//!
//! ## Overview
//!
//! The system is a conventional REST API layered over a relational model.
//! Three pieces carry the domain logic:
//!
//! - **The recipe aggregate** ([`db::handlers::Recipes`]): a recipe is
//!   validated and persisted together with its tag associations and its
//!   ingredient-amount associations as one atomic unit. Updates are full
//!   replaces of both sets, never merges, so readers can never observe a
//!   half-written aggregate.
//! - **The shopping-list aggregation** (also in [`db::handlers::Recipes`]):
//!   the union of ingredient amounts across every recipe in the viewer's
//!   cart, grouped by (ingredient name, measurement unit) and summed.
//! - **Membership toggles** ([`db::handlers::memberships`]): favorites,
//!   shopping carts and subscriptions all follow the same two-state machine.
//!   Adding an already-present pair is a conflict, removing an absent pair is
//!   not found - the transitions are deliberately not idempotent, so a client
//!   can distinguish "newly added" from "was already there".
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and uses PostgreSQL for all persistence needs.
//!
//! Requests pass through a conventional flow: handlers in
//! [`api::handlers`] deserialize and validate payloads ([`api::models`]),
//! resolve the acting user through the session extractors in
//! [`auth::current_user`], and execute against repositories in
//! [`db::handlers`] which own all SQL. Derived per-viewer fields
//! (`is_favorited`, `is_in_shopping_cart`, `is_subscribed`) are computed at
//! read time for the requesting user - anonymous viewers always see them as
//! false.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use larder::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = larder::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     larder::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod media;
mod openapi;
pub mod telemetry;
mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

#[cfg(test)]
mod test;

use crate::api::handlers;
use crate::config::CorsOrigin;
use crate::db::handlers::{Repository, Users};
use crate::db::models::users::UserCreateDBRequest;
use crate::openapi::ApiDoc;
use axum::http::HeaderValue;
use axum::{
    Router, http,
    routing::{delete, get, patch, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use types::{IngredientId, Operation, RecipeId, Resource, TagId, UserId};

/// Application state shared across all request handlers.
///
/// Holds the PostgreSQL connection pool and the loaded configuration; both
/// are cheap to clone per request.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

/// Get the larder database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// This function is idempotent - it will create a new admin user if one
/// doesn't exist, or update the password if the user already exists. It is
/// called during application startup to ensure there's always an admin
/// available to maintain tags and ingredients.
///
/// Returns the user ID of the created or existing admin user.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(email: &str, password: Option<&str>, db: &PgPool) -> Result<UserId, anyhow::Error> {
    // Hash password if provided
    let password_hash = match password {
        Some(pwd) => Some(auth::password::hash_string(pwd).map_err(|e| anyhow::anyhow!("Failed to hash admin password: {e}"))?),
        None => None,
    };

    let mut tx = db.begin().await?;
    let mut user_repo = Users::new(&mut tx);

    // Check if user already exists
    if let Some(existing_user) = user_repo.get_user_by_email(email).await? {
        if let Some(password_hash) = password_hash {
            sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE email = $2")
                .bind(password_hash)
                .bind(email)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        return Ok(existing_user.id);
    }

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            username: email.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            is_admin: true,
            password_hash,
        })
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create admin user: {e}"))?;

    tx.commit().await?;
    Ok(created_user.id)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.auth.cors.allowed_origins {
        let header_value = match origin {
            CorsOrigin::Wildcard => "*".parse::<HeaderValue>()?,
            CorsOrigin::Url(url) => url.as_str().trim_end_matches('/').parse::<HeaderValue>()?,
        };
        origins.push(header_value);
    }

    let mut cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.auth.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Authentication routes (register, login, logout, password change)
/// - The versioned API (users, subscriptions, tags, ingredients, recipes,
///   favorites, shopping cart, shopping-list download)
/// - Media file serving for uploaded recipe images
/// - OpenAPI documentation
/// - CORS configuration and tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    // Authentication routes at root level
    let auth_routes = Router::new()
        .route("/authentication/register", post(handlers::auth::register))
        .route("/authentication/login", post(handlers::auth::login))
        .route("/authentication/logout", post(handlers::auth::logout))
        .route("/authentication/password-change", post(handlers::auth::change_password))
        .with_state(state.clone());

    // API routes
    let api_routes = Router::new()
        // Users and subscriptions
        .route("/users", get(handlers::users::list_users))
        .route("/users/me", get(handlers::users::me))
        .route("/users/subscriptions", get(handlers::users::list_subscriptions))
        .route("/users/{id}", get(handlers::users::get_user))
        .route("/users/{id}/subscribe", post(handlers::users::subscribe))
        .route("/users/{id}/subscribe", delete(handlers::users::unsubscribe))
        // Tags (public reads, admin writes)
        .route("/tags", get(handlers::tags::list_tags))
        .route("/tags", post(handlers::tags::create_tag))
        .route("/tags/{id}", get(handlers::tags::get_tag))
        // Ingredients (public reads, admin writes)
        .route("/ingredients", get(handlers::ingredients::list_ingredients))
        .route("/ingredients", post(handlers::ingredients::create_ingredient))
        .route("/ingredients/{id}", get(handlers::ingredients::get_ingredient))
        // Recipes
        .route("/recipes", get(handlers::recipes::list_recipes))
        .route("/recipes", post(handlers::recipes::create_recipe))
        .route("/recipes/download-shopping-cart", get(handlers::recipes::download_shopping_cart))
        .route("/recipes/{id}", get(handlers::recipes::get_recipe))
        .route("/recipes/{id}", patch(handlers::recipes::update_recipe))
        .route("/recipes/{id}", delete(handlers::recipes::delete_recipe))
        // Membership toggles
        .route("/recipes/{id}/favorite", post(handlers::recipes::add_favorite))
        .route("/recipes/{id}/favorite", delete(handlers::recipes::remove_favorite))
        .route("/recipes/{id}/shopping-cart", post(handlers::recipes::add_to_cart))
        .route("/recipes/{id}/shopping-cart", delete(handlers::recipes::remove_from_cart))
        .with_state(state.clone());

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .merge(auth_routes)
        .nest("/api/v1", api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        // Uploaded recipe images
        .nest_service("/media", ServeDir::new(&state.config.media_root));

    // Create CORS layer from config
    let cors_layer = create_cors_layer(&state.config)?;
    let router = router.layer(cors_layer);

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to the database, runs
///    migrations and bootstraps the initial admin user
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts
///    handling requests
/// 3. **Shutdown**: when the shutdown signal resolves, in-flight requests
///    drain and connections are closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::new_with_pool(config, None).await
    }

    /// Create an application on an existing pool (used by tests)
    pub async fn new_with_pool(config: Config, pool: Option<PgPool>) -> anyhow::Result<Self> {
        let pool = match pool {
            Some(pool) => pool,
            None => PgPool::connect(&config.database.url).await?,
        };

        migrator().run(&pool).await?;

        // Ensure there is always an admin available
        create_initial_admin_user(&config.admin_email, config.admin_password.as_deref(), &pool).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Larder listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        info!("Closing database connections...");
        self.pool.close().await;

        // Shutdown telemetry
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
