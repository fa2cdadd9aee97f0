//! 全量 JSON 备份
//!
//! 每张表导出到 `backups/<label>-<YYYYMMDD-HHMMSS>.json`，保留最新的 N 份。
//! 密码哈希不会被序列化，备份只用于审阅和人工恢复。

use serde::Serialize;
use shared::error::{AppError, AppResult};
use shared::models::{
    AttendanceRecord, AuditActionRecord, DataChange, Holiday, LeaveRequest, SystemSettings,
    Teacher,
};
use sqlx::SqlitePool;
use std::path::Path;

use crate::db::repository::{
    attendance, audit_action, data_change, holiday, request, settings, teacher,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot {
    created_at: i64,
    label: String,
    teachers: Vec<Teacher>,
    attendance: Vec<AttendanceRecord>,
    requests: Vec<LeaveRequest>,
    holidays: Vec<Holiday>,
    settings: SystemSettings,
    audit_actions: Vec<AuditActionRecord>,
    data_changes: Vec<DataChange>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupInfo {
    pub file_name: String,
    pub size_bytes: u64,
    /// 文件修改时间 (millis)
    pub created_at: i64,
}

/// 文件名只保留字母数字、`-` 和 `_`
fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .take(40)
        .collect();
    if cleaned.is_empty() {
        "manual".to_string()
    } else {
        cleaned
    }
}

fn is_backup_file(name: &str) -> bool {
    name.ends_with(".json")
}

pub async fn create_backup(pool: &SqlitePool, dir: &Path, label: &str) -> AppResult<BackupInfo> {
    let label = sanitize_label(label);
    let snapshot = Snapshot {
        created_at: shared::util::now_millis(),
        teachers: teacher::find_all(pool, &Default::default()).await?,
        attendance: attendance::find_all(pool).await?,
        requests: request::find_all(pool, &Default::default()).await?,
        holidays: holiday::find_all(pool, true).await?,
        settings: settings::get(pool).await?,
        audit_actions: audit_action::find_all(pool).await?,
        data_changes: data_change::find_all(pool).await?,
        label: label.clone(),
    };

    let body = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| AppError::internal(format!("Failed to serialize backup: {e}")))?;

    let file_name = format!(
        "{label}-{}.json",
        chrono::Local::now().format("%Y%m%d-%H%M%S-%3f")
    );
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::storage(format!("Failed to create backup directory: {e}")))?;
    tokio::fs::write(dir.join(&file_name), &body)
        .await
        .map_err(|e| AppError::storage(format!("Failed to write backup {file_name}: {e}")))?;

    tracing::info!(file = %file_name, bytes = body.len(), "Backup written");

    Ok(BackupInfo {
        file_name,
        size_bytes: body.len() as u64,
        created_at: snapshot.created_at,
    })
}

/// 最新的在前
pub async fn list_backups(dir: &Path) -> AppResult<Vec<BackupInfo>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(AppError::storage(format!("Failed to read backups: {e}"))),
    };

    let mut backups = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| AppError::storage(format!("Failed to read backups: {e}")))?
    {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !is_backup_file(&file_name) {
            continue;
        }
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        let created_at = meta
            .modified()
            .ok()
            .map(|t| chrono::DateTime::<chrono::Utc>::from(t).timestamp_millis())
            .unwrap_or(0);
        backups.push(BackupInfo {
            file_name,
            size_bytes: meta.len(),
            created_at,
        });
    }

    // 同一秒内写入的文件按名字排序兜底
    backups.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.file_name.cmp(&a.file_name))
    });
    Ok(backups)
}

/// 只保留最新的 `keep` 份，返回删除数量
pub async fn prune_backups(dir: &Path, keep: usize) -> AppResult<usize> {
    let backups = list_backups(dir).await?;
    let mut removed = 0;
    for old in backups.iter().skip(keep) {
        match tokio::fs::remove_file(dir.join(&old.file_name)).await {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(file = %old.file_name, error = %e, "Failed to remove old backup"),
        }
    }
    if removed > 0 {
        tracing::info!(removed, keep, "Old backups pruned");
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;

    #[test]
    fn test_sanitize_label() {
        assert_eq!(sanitize_label("../../etc/passwd"), "etcpasswd");
        assert_eq!(sanitize_label("  "), "manual");
        assert_eq!(sanitize_label("before-term_2"), "before-term_2");
    }

    #[tokio::test]
    async fn test_backup_and_prune() {
        let db = DbService::in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let info = create_backup(&db.pool, dir.path(), "auto").await.unwrap();
        assert!(info.file_name.starts_with("auto-"));
        assert!(info.size_bytes > 0);

        let content = std::fs::read_to_string(dir.path().join(&info.file_name)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["settings"]["workStartTime"], "07:30");
        assert!(json["teachers"].as_array().unwrap().is_empty());

        for name in ["a-20250101-000000.json", "b-20250102-000000.json"] {
            std::fs::write(dir.path().join(name), "{}").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        assert_eq!(list_backups(dir.path()).await.unwrap().len(), 3);
        let removed = prune_backups(dir.path(), 1).await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(list_backups(dir.path()).await.unwrap().len(), 1);
        assert!(dir.path().join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_same_label_backups_do_not_overwrite() {
        let db = DbService::in_memory().await.unwrap();
        let dir = tempfile::tempdir().unwrap();

        let first = create_backup(&db.pool, dir.path(), "term").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = create_backup(&db.pool, dir.path(), "term").await.unwrap();

        assert_ne!(first.file_name, second.file_name);
        assert_eq!(list_backups(dir.path()).await.unwrap().len(), 2);
    }
}
