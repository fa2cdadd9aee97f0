//! Manager API Module

mod handler;

use axum::{Router, middleware, routing::get};
use shared::models::Role;

use crate::auth::require_role;
use crate::core::ServerState;

/// Manager router (MANAGER 及以上)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/manager", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/team-status", get(handler::team_status))
        .route("/pending-approvals", get(handler::pending_approvals))
        .layer(middleware::from_fn(require_role(Role::Manager)))
}
