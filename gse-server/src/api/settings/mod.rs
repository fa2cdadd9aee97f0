//! System Settings API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};
use shared::models::Capability;

use crate::auth::require_capability;
use crate::core::ServerState;

/// Settings router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/settings", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::get));

    let manage_routes = Router::new()
        .route("/", put(handler::update))
        .layer(middleware::from_fn(require_capability(
            Capability::ManageSettings,
        )));

    read_routes.merge(manage_routes)
}
