//! Attendance API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use shared::models::Capability;

use crate::auth::require_capability;
use crate::core::ServerState;

/// Attendance router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/attendance", routes())
}

fn routes() -> Router<ServerState> {
    // 自助路由：签到签退、查询（员工只能看到自己的记录）
    let self_routes = Router::new()
        .route("/", get(handler::list))
        .route("/today", get(handler::today))
        .route("/check-in", post(handler::check_in))
        .route("/check-out", post(handler::check_out));

    // 管理路由：手工录入和更正
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/{id}", put(handler::update))
        .layer(middleware::from_fn(require_capability(
            Capability::ManageAttendance,
        )));

    self_routes.merge(manage_routes)
}
