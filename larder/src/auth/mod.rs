//! Authentication and authorization.
//!
//! # Authentication
//!
//! Browser-style session authentication: users log in via
//! `/authentication/login` with email and password, and receive a signed JWT
//! in a secure, HTTP-only cookie. Every request to a protected endpoint
//! carries the cookie; the [`current_user`] extractors verify it and resolve
//! the acting user. Public read endpoints use the [`current_user::MaybeUser`]
//! extractor, which yields an explicit anonymous marker instead of rejecting.
//!
//! # Authorization
//!
//! Ownership-based: users can modify their own recipes, administrators can
//! modify anything, and reference data (tags, ingredients) is
//! administrator-only. See [`permissions`].
//!
//! # Modules
//!
//! - [`current_user`]: Extractors for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Permission checking logic
//! - [`session`]: JWT session token creation and verification

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
