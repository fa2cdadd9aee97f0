//! Holiday API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use shared::models::Capability;

use crate::auth::require_capability;
use crate::core::ServerState;

/// Holiday router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/holidays", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new().route("/", get(handler::list));

    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_capability(
            Capability::ManageHolidays,
        )));

    read_routes.merge(manage_routes)
}
