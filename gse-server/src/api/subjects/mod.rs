//! Subject API Module
//!
//! Subjects are not stored separately; they are the distinct `subject`
//! values of active teachers.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Subject router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/subjects", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/{subject}/teachers", get(handler::teachers))
}
