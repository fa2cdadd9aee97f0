//! Data Tracking API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use shared::models::Capability;

use crate::auth::{require_admin, require_capability};
use crate::core::ServerState;

/// Data tracking router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/data-tracking", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/statistics", get(handler::statistics))
        .route("/changes", get(handler::changes))
        .route("/changes/{target_type}/{target_id}", get(handler::history))
        .layer(middleware::from_fn(require_capability(Capability::ViewAudit)));

    // 备份 / 压缩仅限 ADMIN
    let admin_routes = Router::new()
        .route("/backup", post(handler::create_backup))
        .route("/backups", get(handler::list_backups))
        .route("/compact", post(handler::compact))
        .layer(middleware::from_fn(require_admin));

    read_routes.merge(admin_routes)
}
