//! Teacher API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Teacher router
///
/// 权限在 handler 内通过 `auth::ensure` 检查 (依赖目标教师的角色)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/teachers", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/summary", get(handler::summary))
        .route("/{id}/balance", get(handler::balance))
        .route("/{id}/notifications", get(handler::notifications))
        .route("/{id}/remaining-hours", get(handler::remaining_hours))
}
