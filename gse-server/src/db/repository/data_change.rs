//! Data Change Repository (append-only tracking log)

use super::{RepoResult, to_json_text};
use shared::models::{ActionKind, DataChange, TargetType};
use sqlx::{SqliteConnection, SqlitePool};

const COLUMNS: &str = "change_id, timestamp, user_id, user_role, action, target_type, target_id, changes, original_data, new_data";

/// List filters
#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<ActionKind>,
}

const FILTER_CLAUSE: &str = "(?1 IS NULL OR target_type = ?1) AND (?2 IS NULL OR target_id = ?2) AND (?3 IS NULL OR user_id = ?3) AND (?4 IS NULL OR action = ?4)";

/// A change together with its insertion sequence (compaction order)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SequencedChange {
    pub seq: i64,
    #[sqlx(flatten)]
    pub change: DataChange,
}

pub async fn insert(pool: &SqlitePool, change: &DataChange) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO data_change (change_id, timestamp, user_id, user_role, action, target_type, target_id, changes, original_data, new_data) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(&change.change_id)
    .bind(change.timestamp)
    .bind(&change.user_id)
    .bind(&change.user_role)
    .bind(change.action)
    .bind(change.target_type)
    .bind(&change.target_id)
    .bind(to_json_text(&change.changes)?)
    .bind(change.original_data.as_ref().map(|v| v.to_string()))
    .bind(change.new_data.as_ref().map(|v| v.to_string()))
    .execute(pool)
    .await?;
    Ok(())
}

/// Newest first; returns (page, total)
pub async fn list(
    pool: &SqlitePool,
    filter: &ChangeFilter,
    limit: u32,
    offset: i64,
) -> RepoResult<(Vec<DataChange>, i64)> {
    let sql = format!(
        "SELECT {COLUMNS} FROM data_change WHERE {FILTER_CLAUSE} ORDER BY seq DESC LIMIT ?5 OFFSET ?6"
    );
    let items = sqlx::query_as::<_, DataChange>(&sql)
        .bind(filter.target_type)
        .bind(filter.target_id.as_deref())
        .bind(filter.user_id.as_deref())
        .bind(filter.action)
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM data_change WHERE {FILTER_CLAUSE}");
    let total = sqlx::query_scalar::<_, i64>(&count_sql)
        .bind(filter.target_type)
        .bind(filter.target_id.as_deref())
        .bind(filter.user_id.as_deref())
        .bind(filter.action)
        .fetch_one(pool)
        .await?;

    Ok((items, total))
}

/// Full history of one entity, oldest first
pub async fn history(
    pool: &SqlitePool,
    target_type: TargetType,
    target_id: &str,
) -> RepoResult<Vec<DataChange>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM data_change WHERE target_type = ? AND target_id = ? ORDER BY seq"
    );
    let items = sqlx::query_as::<_, DataChange>(&sql)
        .bind(target_type)
        .bind(target_id)
        .fetch_all(pool)
        .await?;
    Ok(items)
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM data_change")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Group counts for one column (`action`, `user_id`, `target_type`)
pub async fn counts_by(pool: &SqlitePool, column: GroupColumn) -> RepoResult<Vec<(String, i64)>> {
    let sql = format!(
        "SELECT {col}, COUNT(*) FROM data_change GROUP BY {col}",
        col = column.as_sql()
    );
    let rows = sqlx::query_as::<_, (String, i64)>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

#[derive(Debug, Clone, Copy)]
pub enum GroupColumn {
    Action,
    User,
    TargetType,
}

impl GroupColumn {
    fn as_sql(self) -> &'static str {
        match self {
            GroupColumn::Action => "action",
            GroupColumn::User => "user_id",
            GroupColumn::TargetType => "target_type",
        }
    }
}

pub async fn last_timestamp(pool: &SqlitePool) -> RepoResult<Option<i64>> {
    let ts = sqlx::query_scalar::<_, Option<i64>>("SELECT MAX(timestamp) FROM data_change")
        .fetch_one(pool)
        .await?;
    Ok(ts)
}

/// Oldest `limit` rows by insertion order
pub async fn oldest(pool: &SqlitePool, limit: i64) -> RepoResult<Vec<SequencedChange>> {
    let sql = format!("SELECT seq, {COLUMNS} FROM data_change ORDER BY seq LIMIT ?");
    let rows = sqlx::query_as::<_, SequencedChange>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Delete every row with `seq <= max_seq`; returns rows removed
pub async fn delete_through(conn: &mut SqliteConnection, max_seq: i64) -> RepoResult<u64> {
    let result = sqlx::query("DELETE FROM data_change WHERE seq <= ?")
        .bind(max_seq)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn archived_total(pool: &SqlitePool) -> RepoResult<i64> {
    let n = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT archived_total FROM tracking_meta WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?
    .flatten()
    .unwrap_or(0);
    Ok(n)
}

pub async fn add_archived(conn: &mut SqliteConnection, n: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO tracking_meta (id, archived_total) VALUES (1, ?1) ON CONFLICT(id) DO UPDATE SET archived_total = archived_total + ?1",
    )
    .bind(n)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<DataChange>> {
    let sql = format!("SELECT {COLUMNS} FROM data_change ORDER BY seq");
    let items = sqlx::query_as::<_, DataChange>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(items)
}
