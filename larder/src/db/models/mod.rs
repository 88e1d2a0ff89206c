//! Database record structures matching table schemas.
//!
//! Requests and responses follow the `*CreateDBRequest` / `*UpdateDBRequest` /
//! `*DBResponse` naming convention. These types are distinct from the API
//! models in [`crate::api::models`] so the storage representation can evolve
//! independently of the public contract.

pub mod ingredients;
pub mod recipes;
pub mod tags;
pub mod users;
