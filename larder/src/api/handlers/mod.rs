//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks
//! - Business logic execution via database repositories
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`auth`]: Registration, login, logout and password change
//! - [`ingredients`]: Ingredient reference data (public reads, admin writes)
//! - [`recipes`]: Recipe CRUD, favorite/cart toggles and the shopping-list
//!   download
//! - [`tags`]: Tag reference data (public reads, admin writes)
//! - [`users`]: User profiles and author subscriptions
//!
//! # Authentication
//!
//! Mutating handlers take the `CurrentUser` extractor and reject
//! unauthenticated requests; public reads take `MaybeUser` and treat the
//! absence of a session as the anonymous viewer.
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and response bodies.

pub mod auth;
pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;
