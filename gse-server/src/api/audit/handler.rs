//! Audit API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    ActionKind, AuditActionRecord, Paginated, RevokePayload, TargetType, page_window,
};

use crate::audit::{self, RevokeOutcome};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::audit_action::{self, AuditFilter};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok, ok_with_message};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    pub action: Option<ActionKind>,
    pub user_id: Option<String>,
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
    pub revoked: Option<bool>,
    /// Millis, inclusive
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// 分页查询，最新在前
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<ApiResponse<Paginated<AuditActionRecord>>>> {
    if let (Some(from), Some(to)) = (query.from, query.to)
        && to < from
    {
        return Err(AppError::new(ErrorCode::InvalidDateRange));
    }

    let (page, limit, offset) = page_window(query.page, query.limit);
    let filter = AuditFilter {
        action: query.action,
        user_id: query.user_id.filter(|s| !s.is_empty()),
        target_type: query.target_type,
        target_id: query.target_id.filter(|s| !s.is_empty()),
        revoked: query.revoked,
        from: query.from,
        to: query.to,
    };
    let (items, total) = audit_action::list(&state.pool, &filter, limit, offset).await?;

    Ok(ok(Paginated {
        items,
        total,
        page,
        limit,
    }))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(action_id): Path<String>,
) -> AppResult<Json<ApiResponse<AuditActionRecord>>> {
    let record = audit_action::find_by_id(&state.pool, &action_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::AuditActionNotFound,
                format!("Audit action {action_id} not found"),
            )
        })?;
    Ok(ok(record))
}

/// 撤销审批 / 拒绝操作，关联申请回到 pending
pub async fn revoke(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(action_id): Path<String>,
    payload: Option<Json<RevokePayload>>,
) -> AppResult<Json<ApiResponse<RevokeOutcome>>> {
    let reason = payload.and_then(|Json(p)| p.reason);
    let outcome = audit::revoke(
        &state.pool,
        &state.tracker,
        &user,
        &action_id,
        reason.as_deref(),
    )
    .await?;
    Ok(ok_with_message("Action revoked", outcome))
}
