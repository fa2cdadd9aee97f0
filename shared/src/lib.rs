//! Shared types for the GSE attendance server
//!
//! Entity models, request/response DTOs, closed vocabularies and the
//! unified error system used by the server and its API consumers.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
