//! HTTP API layer: request handlers and the public data models.

pub mod handlers;
pub mod models;
