//! 追踪日志压缩
//!
//! 日志超过 [`MAX_TRACKED_CHANGES`] 条时，最旧的记录先写入
//! `archive/data-changes-<timestamp>.jsonl`，再从表中删除，只保留最新的
//! [`COMPACT_TO`] 条。由后台定时任务执行，也可由管理员手动触发。

use serde::Serialize;
use shared::error::{AppError, AppResult};
use sqlx::SqlitePool;
use std::path::Path;

use super::DataTracker;
use crate::db::repository::{RepoError, data_change};

pub const MAX_TRACKED_CHANGES: i64 = 10_000;
pub const COMPACT_TO: i64 = 9_000;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompactionReport {
    pub archived: u64,
    pub archive_file: Option<String>,
    pub remaining: i64,
}

/// 按默认阈值压缩；`force` 时只要超过保留数就压缩
pub async fn compact(
    pool: &SqlitePool,
    tracker: &DataTracker,
    archive_dir: &Path,
    force: bool,
) -> AppResult<CompactionReport> {
    let threshold = if force { COMPACT_TO } else { MAX_TRACKED_CHANGES };
    compact_with_limits(pool, tracker, archive_dir, threshold, COMPACT_TO).await
}

/// 行数 > `threshold` 时压缩到 `keep` 条
pub async fn compact_with_limits(
    pool: &SqlitePool,
    tracker: &DataTracker,
    archive_dir: &Path,
    threshold: i64,
    keep: i64,
) -> AppResult<CompactionReport> {
    let total = data_change::count(pool).await?;
    if total <= threshold {
        return Ok(CompactionReport {
            remaining: total,
            ..Default::default()
        });
    }

    let excess = total - keep;
    let rows = data_change::oldest(pool, excess).await?;
    let Some(max_seq) = rows.last().map(|r| r.seq) else {
        return Ok(CompactionReport {
            remaining: total,
            ..Default::default()
        });
    };

    let mut lines = String::new();
    for row in &rows {
        let line = serde_json::to_string(&row.change)
            .map_err(|e| AppError::internal(format!("Failed to serialize archived change: {e}")))?;
        lines.push_str(&line);
        lines.push('\n');
    }

    let file_name = format!(
        "data-changes-{}.jsonl",
        chrono::Local::now().format("%Y%m%d-%H%M%S-%3f")
    );
    tokio::fs::create_dir_all(archive_dir)
        .await
        .map_err(|e| AppError::storage(format!("Failed to create archive directory: {e}")))?;
    let path = archive_dir.join(&file_name);
    tokio::fs::write(&path, lines)
        .await
        .map_err(|e| AppError::storage(format!("Failed to write archive {file_name}: {e}")))?;

    // 归档文件落盘后才删除
    let mut tx = pool.begin().await.map_err(RepoError::from)?;
    let removed = data_change::delete_through(&mut tx, max_seq).await?;
    data_change::add_archived(&mut tx, removed as i64).await?;
    tx.commit().await.map_err(RepoError::from)?;

    tracker.warm_up().await?;
    let remaining = data_change::count(pool).await?;

    tracing::info!(
        archived = removed,
        remaining,
        file = %file_name,
        "Tracking log compacted"
    );

    Ok(CompactionReport {
        archived: removed,
        archive_file: Some(file_name),
        remaining,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CurrentUser;
    use crate::db::DbService;
    use shared::models::{ActionKind, Role, TargetType};

    #[tokio::test]
    async fn test_compaction_archives_oldest_rows() {
        let db = DbService::in_memory().await.unwrap();
        let tracker = DataTracker::new(db.pool.clone());
        let actor = CurrentUser {
            id: "m1".into(),
            name: "Manager".into(),
            email: "m@school.test".into(),
            role: Role::Manager,
            role_level: 2,
            authorities: vec![],
        };
        for i in 0..12 {
            let row = serde_json::json!({"n": i});
            tracker
                .track(
                    &actor,
                    ActionKind::CheckIn,
                    TargetType::Attendance,
                    &format!("a{i}"),
                    None,
                    Some(&row),
                )
                .await
                .unwrap();
        }

        let dir = tempfile::tempdir().unwrap();
        let report = compact_with_limits(&db.pool, &tracker, dir.path(), 10, 9)
            .await
            .unwrap();

        assert_eq!(report.archived, 3);
        assert_eq!(report.remaining, 9);
        let file = dir.path().join(report.archive_file.unwrap());
        let content = std::fs::read_to_string(file).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.lines().next().unwrap().contains("\"targetId\":\"a0\""));

        let stats = tracker.statistics();
        assert_eq!(stats.total_changes, 9);
        assert_eq!(stats.archived_total, 3);

        // 低于阈值不做任何事
        let noop = compact_with_limits(&db.pool, &tracker, dir.path(), 10, 9)
            .await
            .unwrap();
        assert_eq!(noop.archived, 0);
        assert!(noop.archive_file.is_none());
    }
}
