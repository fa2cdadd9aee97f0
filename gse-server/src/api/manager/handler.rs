//! Manager API Handlers

use axum::{Json, extract::State};
use shared::models::LeaveRequest;

use crate::analytics::dashboard::{self, TeacherDay};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{attendance, request, teacher};
use crate::utils::time::{format_date, local_today};
use crate::utils::{ApiResponse, AppResult, ok};

/// 所有在职教师 + 今日考勤状态
pub async fn team_status(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<TeacherDay>>>> {
    let active = teacher::find_active(&state.pool).await?;
    let records = attendance::find_by_date(&state.pool, &format_date(local_today())).await?;
    Ok(ok(dashboard::team_status(&active, &records)))
}

/// 待审批申请，不含本人的
pub async fn pending_approvals(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Vec<LeaveRequest>>>> {
    let pending: Vec<LeaveRequest> = request::find_pending(&state.pool)
        .await?
        .into_iter()
        .filter(|r| r.teacher_id != user.id)
        .collect();
    Ok(ok(pending))
}
