use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::audit::{DataTracker, backup, compaction};
use crate::auth::{JwtService, password};
use crate::core::config::ensure_work_dir_structure;
use crate::core::{BackgroundTasks, Config, Result, ServerError};
use crate::db::DbService;
use crate::db::repository::teacher;

/// 每日自动备份
const BACKUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// 服务器状态 - 持有所有服务的共享引用
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | pool | SqlitePool | SQLite 连接池 |
/// | jwt_service | Arc<JwtService> | JWT 认证服务 |
/// | tracker | Arc<DataTracker> | 数据追踪 / 审计 |
#[derive(Clone, Debug)]
pub struct ServerState {
    pub config: Config,
    pub pool: SqlitePool,
    pub jwt_service: Arc<JwtService>,
    pub tracker: Arc<DataTracker>,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 1. 工作目录结构
    /// 2. 数据库 (work_dir/database/gse.db) + 迁移
    /// 3. 统计预热、初始管理员
    pub async fn initialize(config: &Config) -> Result<Self> {
        ensure_work_dir_structure(&config.work_path())?;

        let db_path = config.database_path();
        let db = DbService::new(&db_path.to_string_lossy()).await?;

        Self::from_pool(config.clone(), db.pool).await
    }

    /// 基于已有连接池构造 (测试使用内存数据库)
    pub async fn from_pool(config: Config, pool: SqlitePool) -> Result<Self> {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let tracker = Arc::new(DataTracker::new(pool.clone()));
        tracker
            .warm_up()
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;

        let state = Self {
            config,
            pool,
            jwt_service,
            tracker,
        };
        state.bootstrap_admin().await?;
        Ok(state)
    }

    /// 空库且配置了 ADMIN_EMAIL / ADMIN_PASSWORD 时创建初始管理员
    async fn bootstrap_admin(&self) -> Result<()> {
        let (Some(email), Some(pwd)) = (&self.config.admin_email, &self.config.admin_password)
        else {
            return Ok(());
        };

        let existing = teacher::count(&self.pool)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;
        if existing > 0 {
            return Ok(());
        }

        let hash = password::hash_password(pwd)?;
        let admin = teacher::create_admin(&self.pool, "Administrator", email, &hash)
            .await
            .map_err(|e| ServerError::Database(e.to_string()))?;
        tracing::info!(admin_id = %admin.id, email = %admin.email, "Bootstrapped initial admin account");
        Ok(())
    }

    /// 启动后台任务
    ///
    /// - 追踪日志压缩 (启动时一次，之后按 COMPACTION_INTERVAL_SECS)
    /// - 每日备份 + 按 BACKUP_RETENTION 清理旧备份
    pub fn start_background_tasks(&self) -> BackgroundTasks {
        let mut tasks = BackgroundTasks::new();

        let state = self.clone();
        tasks.spawn_periodic(
            "tracking_compaction",
            Duration::from_secs(self.config.compaction_interval_secs.max(1)),
            move || {
                let state = state.clone();
                async move {
                    let archive_dir = state.config.archive_dir();
                    match compaction::compact(&state.pool, &state.tracker, &archive_dir, false).await {
                        Ok(report) if report.archived > 0 => {
                            tracing::info!(
                                archived = report.archived,
                                remaining = report.remaining,
                                file = ?report.archive_file,
                                "Compacted data change log"
                            );
                        }
                        Ok(_) => {}
                        Err(e) => tracing::error!(error = %e, "Data change compaction failed"),
                    }
                }
            },
        );

        let state = self.clone();
        tasks.spawn_periodic("daily_backup", BACKUP_INTERVAL, move || {
            let state = state.clone();
            async move {
                let dir = state.config.backups_dir();
                match backup::create_backup(&state.pool, &dir, "auto").await {
                    Ok(info) => tracing::info!(file = %info.file_name, "Automatic backup written"),
                    Err(e) => tracing::error!(error = %e, "Automatic backup failed"),
                }
                match backup::prune_backups(&dir, state.config.backup_retention).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(removed = n, "Pruned old backups"),
                    Err(e) => tracing::error!(error = %e, "Backup pruning failed"),
                }
            }
        });

        tasks.log_summary();
        tasks
    }
}
