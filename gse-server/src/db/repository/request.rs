//! Leave Request Repository
//!
//! Status updates are guarded by the current status in the WHERE clause,
//! so a lost race shows up as `rows_affected == 0`.

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{LeaveRequest, RequestStatus, RequestType};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "id, teacher_id, teacher_name, request_type, status, start_date, end_date, duration, reason, approved_by, approver_name, approved_at, rejected_by, rejection_reason, rejected_at, created_at, updated_at";

/// List filters
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub teacher_id: Option<String>,
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
    /// Requests overlapping [from, to]
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<LeaveRequest>> {
    let sql = format!("SELECT {COLUMNS} FROM leave_request WHERE id = ?");
    let request = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(request)
}

pub async fn find_all(pool: &SqlitePool, filter: &RequestFilter) -> RepoResult<Vec<LeaveRequest>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM leave_request WHERE (?1 IS NULL OR teacher_id = ?1) AND (?2 IS NULL OR status = ?2) AND (?3 IS NULL OR request_type = ?3) AND (?4 IS NULL OR end_date >= ?4) AND (?5 IS NULL OR start_date <= ?5) ORDER BY created_at DESC"
    );
    let requests = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(filter.teacher_id.as_deref())
        .bind(filter.status)
        .bind(filter.request_type)
        .bind(filter.from.as_deref())
        .bind(filter.to.as_deref())
        .fetch_all(pool)
        .await?;
    Ok(requests)
}

pub async fn find_pending(pool: &SqlitePool) -> RepoResult<Vec<LeaveRequest>> {
    find_all(
        pool,
        &RequestFilter {
            status: Some(RequestStatus::Pending),
            ..Default::default()
        },
    )
    .await
}

pub async fn insert(pool: &SqlitePool, request: &LeaveRequest) -> RepoResult<LeaveRequest> {
    sqlx::query(
        "INSERT INTO leave_request (id, teacher_id, teacher_name, request_type, status, start_date, end_date, duration, reason, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
    )
    .bind(&request.id)
    .bind(&request.teacher_id)
    .bind(&request.teacher_name)
    .bind(request.request_type)
    .bind(request.status)
    .bind(&request.start_date)
    .bind(&request.end_date)
    .bind(request.duration)
    .bind(request.reason.as_deref())
    .bind(request.created_at)
    .execute(pool)
    .await?;

    find_by_id(pool, &request.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create request".into()))
}

fn transition_lost(id: &str) -> RepoError {
    RepoError::Business(
        ErrorCode::InvalidStatusTransition,
        format!("Request {id} is no longer pending"),
    )
}

/// pending → approved
pub async fn approve(
    pool: &SqlitePool,
    id: &str,
    approver_id: &str,
    approver_name: &str,
) -> RepoResult<LeaveRequest> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE leave_request SET status = 'approved', approved_by = ?1, approver_name = ?2, approved_at = ?3, updated_at = ?3 WHERE id = ?4 AND status = 'pending'",
    )
    .bind(approver_id)
    .bind(approver_name)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_lost(id));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Request {id} not found")))
}

/// pending → rejected
pub async fn reject(
    pool: &SqlitePool,
    id: &str,
    rejected_by: &str,
    reason: Option<&str>,
) -> RepoResult<LeaveRequest> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE leave_request SET status = 'rejected', rejected_by = ?1, rejection_reason = ?2, rejected_at = ?3, updated_at = ?3 WHERE id = ?4 AND status = 'pending'",
    )
    .bind(rejected_by)
    .bind(reason)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_lost(id));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Request {id} not found")))
}

/// pending → revoked (requester withdraws)
pub async fn cancel(pool: &SqlitePool, id: &str) -> RepoResult<LeaveRequest> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE leave_request SET status = 'revoked', updated_at = ?1 WHERE id = ?2 AND status = 'pending'",
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(transition_lost(id));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Request {id} not found")))
}

/// approved / rejected → pending, clearing the decision metadata (audit revocation)
///
/// Runs on the caller's transaction.
pub async fn reset_to_pending(
    conn: &mut SqliteConnection,
    id: &str,
    from: RequestStatus,
) -> RepoResult<()> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE leave_request SET status = 'pending', approved_by = NULL, approver_name = NULL, approved_at = NULL, rejected_by = NULL, rejection_reason = NULL, rejected_at = NULL, updated_at = ?1 WHERE id = ?2 AND status = ?3",
    )
    .bind(now)
    .bind(id)
    .bind(from)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::InvalidStatusTransition,
            format!("Request {id} is not {}", from.as_str()),
        ));
    }
    Ok(())
}

pub async fn find_by_id_tx(
    conn: &mut SqliteConnection,
    id: &str,
) -> RepoResult<Option<LeaveRequest>> {
    let sql = format!("SELECT {COLUMNS} FROM leave_request WHERE id = ?");
    let request = sqlx::query_as::<_, LeaveRequest>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(request)
}
