//! 数据追踪器
//!
//! 处理器在每次变更后上报前后快照，追踪器负责：
//! 1. 计算字段级 diff
//! 2. 追加 `data_change` 记录
//! 3. 更新内存统计 (DashMap 计数器，启动时从表中预热)
//! 4. 重要操作或管理员操作镜像到审计记录

use dashmap::DashMap;
use serde::Serialize;
use shared::models::{
    ActionKind, AuditActionRecord, DataChange, Role, TargetType, TrackingStatistics,
};
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use super::diff;
use crate::auth::CurrentUser;
use crate::db::repository::data_change::GroupColumn;
use crate::db::repository::{RepoResult, audit_action, data_change};

/// 一次追踪的结果
#[derive(Debug, Clone)]
pub struct Tracked {
    pub change: DataChange,
    /// 镜像到审计记录时的 action id
    pub audit_action_id: Option<String>,
}

pub struct DataTracker {
    pool: SqlitePool,
    total: AtomicU64,
    archived_total: AtomicU64,
    last_change_at: AtomicI64,
    by_action: DashMap<String, u64>,
    by_user: DashMap<String, u64>,
    by_target_type: DashMap<String, u64>,
}

impl std::fmt::Debug for DataTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataTracker")
            .field("total", &self.total.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn load_counts(target: &DashMap<String, u64>, rows: Vec<(String, i64)>) {
    target.clear();
    for (key, n) in rows {
        target.insert(key, n.max(0) as u64);
    }
}

fn to_btree(map: &DashMap<String, u64>) -> std::collections::BTreeMap<String, u64> {
    map.iter().map(|e| (e.key().clone(), *e.value())).collect()
}

impl DataTracker {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            total: AtomicU64::new(0),
            archived_total: AtomicU64::new(0),
            last_change_at: AtomicI64::new(0),
            by_action: DashMap::new(),
            by_user: DashMap::new(),
            by_target_type: DashMap::new(),
        }
    }

    /// 从 `data_change` 表重建统计（启动时、压缩后）
    pub async fn warm_up(&self) -> RepoResult<()> {
        let total = data_change::count(&self.pool).await?;
        let archived = data_change::archived_total(&self.pool).await?;
        let last = data_change::last_timestamp(&self.pool).await?;

        load_counts(
            &self.by_action,
            data_change::counts_by(&self.pool, GroupColumn::Action).await?,
        );
        load_counts(
            &self.by_user,
            data_change::counts_by(&self.pool, GroupColumn::User).await?,
        );
        load_counts(
            &self.by_target_type,
            data_change::counts_by(&self.pool, GroupColumn::TargetType).await?,
        );
        self.total.store(total.max(0) as u64, Ordering::Relaxed);
        self.archived_total
            .store(archived.max(0) as u64, Ordering::Relaxed);
        self.last_change_at.store(last.unwrap_or(0), Ordering::Relaxed);

        tracing::info!(total, archived, "Data tracker statistics warmed up");
        Ok(())
    }

    pub fn statistics(&self) -> TrackingStatistics {
        let last = self.last_change_at.load(Ordering::Relaxed);
        TrackingStatistics {
            total_changes: self.total.load(Ordering::Relaxed),
            by_action: to_btree(&self.by_action),
            by_user: to_btree(&self.by_user),
            by_target_type: to_btree(&self.by_target_type),
            last_change_at: (last > 0).then_some(last),
            archived_total: self.archived_total.load(Ordering::Relaxed),
        }
    }

    /// 追踪一次变更
    ///
    /// `before` 为 `None` 表示创建，`after` 为 `None` 表示删除。
    pub async fn track<T: Serialize>(
        &self,
        actor: &CurrentUser,
        action: ActionKind,
        target_type: TargetType,
        target_id: &str,
        before: Option<&T>,
        after: Option<&T>,
    ) -> RepoResult<Tracked> {
        let original_data = before.and_then(|v| diff::snapshot(v, target_type));
        let new_data = after.and_then(|v| diff::snapshot(v, target_type));
        let changes = diff::diff(original_data.as_ref(), new_data.as_ref(), target_type);

        let change = DataChange {
            change_id: shared::util::new_id(),
            timestamp: shared::util::now_millis(),
            user_id: actor.id.clone(),
            user_role: actor.role.as_str().to_string(),
            action,
            target_type,
            target_id: target_id.to_string(),
            changes,
            original_data,
            new_data,
        };
        data_change::insert(&self.pool, &change).await?;
        self.bump(&change);

        let audit_action_id = if action.is_significant() || actor.role == Role::Admin {
            let record = AuditActionRecord {
                action_id: shared::util::new_id(),
                timestamp: change.timestamp,
                user_id: actor.id.clone(),
                user_role: change.user_role.clone(),
                user_name: actor.name.clone(),
                action,
                target_type,
                target_id: change.target_id.clone(),
                original_data: change.original_data.clone(),
                new_data: change.new_data.clone(),
                can_be_revoked: action.is_revocable(),
                is_revoked: false,
                revoked_by: None,
                revoked_at: None,
                revocation_reason: None,
            };
            audit_action::insert(&self.pool, &record).await?;
            crate::audit_log!(
                actor.id.as_str(),
                action.as_str(),
                format!("{}:{}", target_type.as_str(), target_id).as_str()
            );
            Some(record.action_id)
        } else {
            None
        };

        Ok(Tracked {
            change,
            audit_action_id,
        })
    }

    /// 追踪变更；失败只记录日志，不影响已提交的业务写入
    pub async fn record<T: Serialize>(
        &self,
        actor: &CurrentUser,
        action: ActionKind,
        target_type: TargetType,
        target_id: &str,
        before: Option<&T>,
        after: Option<&T>,
    ) {
        if let Err(e) = self
            .track(actor, action, target_type, target_id, before, after)
            .await
        {
            tracing::error!(
                action = %action,
                target_type = target_type.as_str(),
                target_id = %target_id,
                error = %e,
                "Failed to track data change"
            );
        }
    }

    fn bump(&self, change: &DataChange) {
        self.total.fetch_add(1, Ordering::Relaxed);
        self.last_change_at
            .fetch_max(change.timestamp, Ordering::Relaxed);
        *self
            .by_action
            .entry(change.action.as_str().to_string())
            .or_insert(0) += 1;
        *self.by_user.entry(change.user_id.clone()).or_insert(0) += 1;
        *self
            .by_target_type
            .entry(change.target_type.as_str().to_string())
            .or_insert(0) += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbService;
    use shared::models::Capability;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: format!("{}-1", role.as_str().to_lowercase()),
            name: "Tester".into(),
            email: "tester@school.test".into(),
            role,
            role_level: role.level(),
            authorities: Capability::defaults_for(role),
        }
    }

    #[tokio::test]
    async fn test_track_updates_statistics() {
        let db = DbService::in_memory().await.unwrap();
        let tracker = DataTracker::new(db.pool.clone());
        tracker.warm_up().await.unwrap();

        let before = serde_json::json!({"name": "A"});
        let after = serde_json::json!({"name": "B"});
        let tracked = tracker
            .track(
                &user(Role::Manager),
                ActionKind::UpdateTeacher,
                TargetType::Teacher,
                "t1",
                Some(&before),
                Some(&after),
            )
            .await
            .unwrap();

        assert_eq!(tracked.change.changes.len(), 1);
        assert!(tracked.audit_action_id.is_some());

        let stats = tracker.statistics();
        assert_eq!(stats.total_changes, 1);
        assert_eq!(stats.by_action.get("UPDATE_TEACHER"), Some(&1));
        assert_eq!(stats.by_target_type.get("teacher"), Some(&1));
        assert!(stats.last_change_at.is_some());
    }

    #[tokio::test]
    async fn test_audit_mirroring_rules() {
        let db = DbService::in_memory().await.unwrap();
        let tracker = DataTracker::new(db.pool.clone());
        let row = serde_json::json!({"dateISO": "2025-01-05"});

        // 员工签到：不是重要操作
        let check_in = tracker
            .track(
                &user(Role::Employee),
                ActionKind::CheckIn,
                TargetType::Attendance,
                "a1",
                None,
                Some(&row),
            )
            .await
            .unwrap();
        assert!(check_in.audit_action_id.is_none());

        // 管理员的任何操作都镜像
        let admin_create = tracker
            .track(
                &user(Role::Admin),
                ActionKind::CreateRequest,
                TargetType::Request,
                "r1",
                None,
                Some(&row),
            )
            .await
            .unwrap();
        let id = admin_create.audit_action_id.unwrap();
        let record = audit_action::find_by_id(&db.pool, &id).await.unwrap().unwrap();
        assert!(!record.can_be_revoked);

        let approve = tracker
            .track(
                &user(Role::Manager),
                ActionKind::ApproveRequest,
                TargetType::Request,
                "r1",
                Some(&row),
                Some(&row),
            )
            .await
            .unwrap();
        let record = audit_action::find_by_id(&db.pool, &approve.audit_action_id.unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(record.can_be_revoked);
        assert_eq!(record.user_name, "Tester");
    }

    #[tokio::test]
    async fn test_warm_up_reads_existing_rows() {
        let db = DbService::in_memory().await.unwrap();
        let first = DataTracker::new(db.pool.clone());
        let row = serde_json::json!({"name": "Eid"});
        for _ in 0..3 {
            first
                .track(
                    &user(Role::Manager),
                    ActionKind::CreateHoliday,
                    TargetType::Holiday,
                    "h1",
                    None,
                    Some(&row),
                )
                .await
                .unwrap();
        }

        let second = DataTracker::new(db.pool.clone());
        second.warm_up().await.unwrap();
        let stats = second.statistics();
        assert_eq!(stats.total_changes, 3);
        assert_eq!(stats.by_user.get("manager-1"), Some(&3));
    }
}
