//! Audit Action Repository

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{ActionKind, AuditActionRecord, TargetType};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "action_id, timestamp, user_id, user_role, user_name, action, target_type, target_id, original_data, new_data, can_be_revoked, is_revoked, revoked_by, revoked_at, revocation_reason";

/// List filters
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<ActionKind>,
    pub user_id: Option<String>,
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
    pub revoked: Option<bool>,
    /// Millis, inclusive
    pub from: Option<i64>,
    /// Millis, inclusive
    pub to: Option<i64>,
}

const FILTER_CLAUSE: &str = "(?1 IS NULL OR action = ?1) AND (?2 IS NULL OR user_id = ?2) AND (?3 IS NULL OR target_type = ?3) AND (?4 IS NULL OR target_id = ?4) AND (?5 IS NULL OR is_revoked = ?5) AND (?6 IS NULL OR timestamp >= ?6) AND (?7 IS NULL OR timestamp <= ?7)";

pub async fn insert(pool: &SqlitePool, record: &AuditActionRecord) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO audit_action (action_id, timestamp, user_id, user_role, user_name, action, target_type, target_id, original_data, new_data, can_be_revoked, is_revoked) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 0)",
    )
    .bind(&record.action_id)
    .bind(record.timestamp)
    .bind(&record.user_id)
    .bind(&record.user_role)
    .bind(&record.user_name)
    .bind(record.action)
    .bind(record.target_type)
    .bind(&record.target_id)
    .bind(record.original_data.as_ref().map(|v| v.to_string()))
    .bind(record.new_data.as_ref().map(|v| v.to_string()))
    .bind(record.can_be_revoked)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_id(pool: &SqlitePool, action_id: &str) -> RepoResult<Option<AuditActionRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM audit_action WHERE action_id = ?");
    let record = sqlx::query_as::<_, AuditActionRecord>(&sql)
        .bind(action_id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

pub async fn find_by_id_tx(
    conn: &mut SqliteConnection,
    action_id: &str,
) -> RepoResult<Option<AuditActionRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM audit_action WHERE action_id = ?");
    let record = sqlx::query_as::<_, AuditActionRecord>(&sql)
        .bind(action_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(record)
}

/// Mark revoked; guarded on `is_revoked = 0` so a concurrent revoke loses
pub async fn mark_revoked(
    conn: &mut SqliteConnection,
    action_id: &str,
    revoked_by: &str,
    reason: Option<&str>,
    revoked_at: i64,
) -> RepoResult<()> {
    let result = sqlx::query(
        "UPDATE audit_action SET is_revoked = 1, revoked_by = ?1, revoked_at = ?2, revocation_reason = ?3 WHERE action_id = ?4 AND is_revoked = 0",
    )
    .bind(revoked_by)
    .bind(revoked_at)
    .bind(reason)
    .bind(action_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::ActionAlreadyRevoked,
            format!("Action {action_id} has already been revoked"),
        ));
    }
    Ok(())
}

/// Newest first; returns (page, total)
pub async fn list(
    pool: &SqlitePool,
    filter: &AuditFilter,
    limit: u32,
    offset: i64,
) -> RepoResult<(Vec<AuditActionRecord>, i64)> {
    let sql = format!(
        "SELECT {COLUMNS} FROM audit_action WHERE {FILTER_CLAUSE} ORDER BY timestamp DESC, rowid DESC LIMIT ?8 OFFSET ?9"
    );
    let items = sqlx::query_as::<_, AuditActionRecord>(&sql)
        .bind(filter.action)
        .bind(filter.user_id.as_deref())
        .bind(filter.target_type)
        .bind(filter.target_id.as_deref())
        .bind(filter.revoked)
        .bind(filter.from)
        .bind(filter.to)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM audit_action WHERE {FILTER_CLAUSE}");
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(filter.action)
        .bind(filter.user_id.as_deref())
        .bind(filter.target_type)
        .bind(filter.target_id.as_deref())
        .bind(filter.revoked)
        .bind(filter.from)
        .bind(filter.to)
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<AuditActionRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM audit_action ORDER BY timestamp");
    let records = sqlx::query_as::<_, AuditActionRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(records)
}
