//! Repository implementations for database access.
//!
//! Each repository wraps a SQLx connection or transaction, provides
//! strongly-typed operations for one table (or one aggregate), handles query
//! construction and parameter binding, and returns domain models from
//! [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Users`]: User account management
//! - [`Tags`], [`Ingredients`]: administrator-maintained reference data
//! - [`Recipes`]: the recipe aggregate (base row + tag set + ingredient set,
//!   written transactionally) and the shopping-list aggregation
//! - [`memberships`]: Favorites, ShoppingCarts and Subscriptions toggles
//!
//! # Common Pattern
//!
//! ```ignore
//! use larder::db::handlers::{Repository, Users};
//!
//! async fn example(pool: &sqlx::PgPool) -> Result<(), Box<dyn std::error::Error>> {
//!     let mut tx = pool.begin().await?;
//!     let mut repo = Users::new(&mut tx);
//!     let user = repo.create(&create_request).await?;
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```

pub mod ingredients;
pub mod memberships;
pub mod recipes;
pub mod repository;
pub mod tags;
pub mod users;

pub use ingredients::Ingredients;
pub use memberships::{Favorites, ShoppingCarts, Subscriptions};
pub use recipes::Recipes;
pub use repository::Repository;
pub use tags::Tags;
pub use users::Users;
