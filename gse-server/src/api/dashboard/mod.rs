//! Dashboard API Module

mod handler;

use axum::{Router, middleware, routing::get};
use shared::models::Capability;

use crate::auth::require_capability;
use crate::core::ServerState;

/// Dashboard router (ViewReports)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/dashboard", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/overview", get(handler::overview))
        .route("/analytics", get(handler::analytics))
        .route("/alerts", get(handler::alerts))
        .route("/quick-stats", get(handler::quick_stats))
        .route("/today-checkins", get(handler::today_checkins))
        .route("/today-absences", get(handler::today_absences))
        .route("/missing-teachers", get(handler::missing_teachers))
        .route("/immediate-requests", get(handler::immediate_requests))
        .layer(middleware::from_fn(require_capability(
            Capability::ViewReports,
        )))
}
