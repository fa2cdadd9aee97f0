//! Analytics API Module
//!
//! 所有接口接受 `period` (today / thisWeek / thisMonth / last3Months)
//! 或 `startDate` + `endDate`

mod handler;

use axum::{Router, middleware, routing::get};
use shared::models::Capability;

use crate::auth::require_capability;
use crate::core::ServerState;

/// Analytics router (ViewReports)
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/analytics", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/attendance/summary", get(handler::attendance_summary))
        .route("/attendance/trend", get(handler::attendance_trend))
        .route("/attendance/weekday", get(handler::attendance_weekday))
        .route("/department/summary", get(handler::department_summary))
        .route("/requests/summary", get(handler::requests_summary))
        .route("/teachers/demographics", get(handler::demographics))
        .layer(middleware::from_fn(require_capability(
            Capability::ViewReports,
        )))
}
