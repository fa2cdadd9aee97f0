//! Audit API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use shared::models::Capability;

use crate::auth::{require_admin, require_capability};
use crate::core::ServerState;

/// Audit router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{action_id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_capability(Capability::ViewAudit)));

    // 撤销仅限 ADMIN
    let revoke_routes = Router::new()
        .route("/revoke/{action_id}", post(handler::revoke))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(revoke_routes)
}
