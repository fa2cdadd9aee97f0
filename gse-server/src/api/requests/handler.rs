//! Leave Request API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::models::{
    ActionKind, LeaveRequest, RejectPayload, RequestCreate, RequestStatus, RequestType,
    TargetType, TransitionOrigin,
};

use crate::auth::{self, Action, CurrentUser, Target};
use crate::core::ServerState;
use crate::db::repository::request::{self, RequestFilter};
use crate::db::repository::teacher;
use crate::utils::time::{format_date, parse_date};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok, ok_with_message};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub teacher_id: Option<String>,
    pub status: Option<RequestStatus>,
    #[serde(rename = "type")]
    pub request_type: Option<RequestType>,
    pub from: Option<String>,
    pub to: Option<String>,
}

async fn load(state: &ServerState, id: &str) -> AppResult<LeaveRequest> {
    request::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::RequestNotFound, format!("Request {id} not found"))
    })
}

/// 员工只能看到自己的申请
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<LeaveRequest>>>> {
    let teacher_id = if auth::can(&user, Action::ReadRequest, Target::Global) {
        query.teacher_id.filter(|s| !s.is_empty())
    } else {
        Some(user.id.clone())
    };
    if let Some(from) = &query.from {
        parse_date(from)?;
    }
    if let Some(to) = &query.to {
        parse_date(to)?;
    }

    let filter = RequestFilter {
        teacher_id,
        status: query.status,
        request_type: query.request_type,
        from: query.from,
        to: query.to,
    };
    Ok(ok(request::find_all(&state.pool, &filter).await?))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let req = load(&state, &id).await?;
    auth::ensure(&user, Action::ReadRequest, Target::OwnedBy(&req.teacher_id))?;
    Ok(ok(req))
}

/// 校验日期并计算时长
///
/// 缺省结束日期 = 开始日期；请假 (天) 缺省时长为包含首尾的天数，
/// 迟到 / 早退 (小时) 必须给出时长。
fn resolve_span(payload: &RequestCreate) -> AppResult<(NaiveDate, NaiveDate, f64)> {
    let start = parse_date(&payload.start_date).map_err(|e| e.with_detail("field", "startDate"))?;
    let end = match &payload.end_date {
        Some(raw) if !raw.trim().is_empty() => {
            parse_date(raw).map_err(|e| e.with_detail("field", "endDate"))?
        }
        _ => start,
    };
    if end < start {
        return Err(AppError::new(ErrorCode::InvalidDateRange));
    }

    let duration = match payload.duration {
        Some(d) if !d.is_finite() || d <= 0.0 => {
            return Err(AppError::validation("duration must be a positive number")
                .with_detail("field", "duration"));
        }
        Some(d) => d,
        None if payload.request_type.is_hourly() => {
            return Err(AppError::validation("duration (hours) is required")
                .with_detail("field", "duration"));
        }
        None => ((end - start).num_days() + 1) as f64,
    };
    Ok((start, end, duration))
}

pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<RequestCreate>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let teacher_id = payload
        .teacher_id
        .clone()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| user.id.clone());
    if teacher_id != user.id && !user.is_manager() {
        return Err(AppError::forbidden("Only managers may file requests for others"));
    }
    auth::ensure(&user, Action::CreateRequest, Target::OwnedBy(&teacher_id))?;

    validate_optional_text(&payload.reason, "reason", MAX_NOTE_LEN)?;
    let (start, end, duration) = resolve_span(&payload)?;

    let owner = teacher::find_by_id(&state.pool, &teacher_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::TeacherNotFound,
                format!("Teacher {teacher_id} not found"),
            )
        })?;

    let now = shared::util::now_millis();
    let new_request = LeaveRequest {
        id: shared::util::new_id(),
        teacher_id: owner.id,
        teacher_name: owner.name,
        request_type: payload.request_type,
        status: RequestStatus::Pending,
        start_date: format_date(start),
        end_date: format_date(end),
        duration,
        reason: payload.reason.filter(|r| !r.trim().is_empty()),
        approved_by: None,
        approver_name: None,
        approved_at: None,
        rejected_by: None,
        rejection_reason: None,
        rejected_at: None,
        created_at: now,
        updated_at: now,
    };
    let created = request::insert(&state.pool, &new_request).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::CreateRequest,
            TargetType::Request,
            &created.id,
            None,
            Some(&created),
        )
        .await;

    tracing::info!(request_id = %created.id, teacher_id = %created.teacher_id, "Request created");
    Ok(ok_with_message("Request created", created))
}

/// 审批前检查：不能审批自己的申请，需要 ApproveRequests，状态必须允许
fn ensure_decidable(user: &CurrentUser, req: &LeaveRequest, to: RequestStatus) -> AppResult<()> {
    if req.teacher_id == user.id {
        crate::security_log!(WARN, "self_approval_denied", user_id = %user.id, request_id = %req.id);
        return Err(AppError::new(ErrorCode::SelfApprovalForbidden));
    }
    auth::ensure(user, Action::DecideRequest, Target::OwnedBy(&req.teacher_id))?;
    ensure_transition(req, to)
}

fn ensure_transition(req: &LeaveRequest, to: RequestStatus) -> AppResult<()> {
    if !req.status.can_transition(to, TransitionOrigin::Workflow) {
        return Err(AppError::with_message(
            ErrorCode::InvalidStatusTransition,
            format!(
                "Cannot move request from {} to {}",
                req.status.as_str(),
                to.as_str()
            ),
        ));
    }
    Ok(())
}

pub async fn approve(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let existing = load(&state, &id).await?;
    ensure_decidable(&user, &existing, RequestStatus::Approved)?;

    let approved = request::approve(&state.pool, &id, &user.id, &user.name).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::ApproveRequest,
            TargetType::Request,
            &id,
            Some(&existing),
            Some(&approved),
        )
        .await;

    tracing::info!(request_id = %id, by = %user.id, "Request approved");
    Ok(ok_with_message("Request approved", approved))
}

pub async fn reject(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    payload: Option<Json<RejectPayload>>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let reason = payload
        .and_then(|Json(p)| p.reason)
        .filter(|r| !r.trim().is_empty());
    validate_optional_text(&reason, "reason", MAX_NOTE_LEN)?;

    let existing = load(&state, &id).await?;
    ensure_decidable(&user, &existing, RequestStatus::Rejected)?;

    let rejected = request::reject(&state.pool, &id, &user.id, reason.as_deref()).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::RejectRequest,
            TargetType::Request,
            &id,
            Some(&existing),
            Some(&rejected),
        )
        .await;

    tracing::info!(request_id = %id, by = %user.id, "Request rejected");
    Ok(ok_with_message("Request rejected", rejected))
}

/// 申请人撤回自己的待审批申请
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<LeaveRequest>>> {
    let existing = load(&state, &id).await?;
    if existing.teacher_id != user.id {
        return Err(AppError::forbidden("Only the requester may cancel a request"));
    }
    auth::ensure(&user, Action::CancelRequest, Target::OwnedBy(&existing.teacher_id))?;
    ensure_transition(&existing, RequestStatus::Revoked)?;

    let cancelled = request::cancel(&state.pool, &id).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::CancelRequest,
            TargetType::Request,
            &id,
            Some(&existing),
            Some(&cancelled),
        )
        .await;

    Ok(ok_with_message("Request cancelled", cancelled))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: RequestType, start: &str, end: Option<&str>, duration: Option<f64>) -> RequestCreate {
        RequestCreate {
            teacher_id: None,
            request_type: kind,
            start_date: start.to_string(),
            end_date: end.map(str::to_string),
            duration,
            reason: None,
        }
    }

    #[test]
    fn test_absence_defaults_to_inclusive_days() {
        let p = payload(RequestType::Absence, "2024-03-10", Some("2024-03-12"), None);
        let (_, _, duration) = resolve_span(&p).unwrap();
        assert_eq!(duration, 3.0);

        let single = payload(RequestType::Absence, "2024-03-10", None, None);
        let (start, end, duration) = resolve_span(&single).unwrap();
        assert_eq!(start, end);
        assert_eq!(duration, 1.0);
    }

    #[test]
    fn test_end_before_start_rejected() {
        let p = payload(RequestType::Absence, "2024-03-12", Some("2024-03-10"), None);
        let err = resolve_span(&p).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateRange);
    }

    #[test]
    fn test_hourly_requires_duration() {
        let p = payload(RequestType::Late, "2024-03-10", None, None);
        assert!(resolve_span(&p).is_err());

        let p = payload(RequestType::Late, "2024-03-10", None, Some(1.5));
        let (_, _, duration) = resolve_span(&p).unwrap();
        assert_eq!(duration, 1.5);

        let p = payload(RequestType::EarlyLeave, "2024-03-10", None, Some(-1.0));
        assert!(resolve_span(&p).is_err());
    }
}
