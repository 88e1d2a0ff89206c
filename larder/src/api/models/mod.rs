//! API request and response data models.
//!
//! This module contains the data structures used for HTTP request
//! deserialization and response serialization. These models define the public
//! API contract.
//!
//! # Design Principles
//!
//! - **Separation of Concerns**: API models are distinct from database
//!   models, allowing independent evolution of API and storage
//!   representations
//! - **Explicit read/write shapes**: writes deserialize into `*Write` /
//!   `*Create` payloads with explicit validation pipelines; reads are
//!   serialized from `*Response` views - the call site picks the type, never
//!   runtime introspection
//! - **OpenAPI**: All models are annotated with `utoipa` for automatic API
//!   docs

pub mod auth;
pub mod ingredients;
pub mod pagination;
pub mod recipes;
pub mod tags;
pub mod users;
