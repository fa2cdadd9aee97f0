//! GSE Server - 学校考勤 / 人事管理服务端
//!
//! # 架构概述
//!
//! - **数据库** (`db`): 嵌入式 SQLite (sqlx)，每个实体一个 repository
//! - **认证** (`auth`): JWT + Argon2，兼容旧版 `gse_` 令牌，集中式权限策略
//! - **审计** (`audit`): 字段级数据追踪、审计记录与撤销
//! - **统计** (`analytics`): 考勤 / 请假 / 人员统计
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! gse-server/src/
//! ├── core/          # 配置、状态、错误、后台任务
//! ├── auth/          # JWT 认证、权限策略、中间件
//! ├── db/            # 数据库层
//! ├── audit/         # 数据追踪与审计
//! ├── analytics/     # 统计聚合
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 工具函数
//! ```

/// Audit log helper - 记录关键业务操作到 `audit` 日志文件
///
/// ```ignore
/// audit_log!(user.id.as_str(), "approve_request", "request:123");
/// audit_log!(user.id.as_str(), "revoke_action", "audit_action:9", "reason: wrong decision");
/// ```
#[macro_export]
macro_rules! audit_log {
    ($user_id:expr, $action:expr, $resource:expr) => {
        tracing::info!(
            target: "audit",
            user_id = $user_id,
            action = $action,
            resource = $resource,
            timestamp = chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
    ($user_id:expr, $action:expr, $resource:expr, $details:expr) => {
        tracing::info!(
            target: "audit",
            user_id = $user_id,
            action = $action,
            resource = $resource,
            details = $details,
            timestamp = chrono::Local::now().to_rfc3339(),
            "AUDIT"
        );
    };
}

/// Security log helper - 记录安全相关事件到 `security` 日志文件
///
/// ```ignore
/// security_log!(WARN, "auth_failed", email = %email, reason = "invalid_password");
/// security_log!(WARN, "permission_denied", user_id = %user.id, capability = "approve_requests");
/// ```
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "WARN",
            $($arg)*
        );
    };
    (ERROR, $event:expr, $($arg:tt)*) => {
        tracing::error!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "ERROR",
            $($arg)*
        );
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(
            target: "security",
            event = $event,
            timestamp = chrono::Local::now().to_rfc3339(),
            level = "INFO",
            $($arg)*
        );
    };
}

pub mod analytics;
pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService};
pub use core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{cleanup_old_logs, init_logger, init_logger_with_file};

/// 设置运行环境：加载 `.env`、创建工作目录、初始化日志
pub fn setup_environment() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let work_dir = std::env::var("WORK_DIR").unwrap_or_else(|_| core::config::DEFAULT_WORK_DIR.into());
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let json_format = std::env::var("LOG_JSON")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(false);

    core::config::ensure_work_dir_structure(std::path::Path::new(&work_dir))?;

    let log_dir = std::path::Path::new(&work_dir).join("logs");
    init_logger_with_file(&log_level, json_format, log_dir.to_str())?;

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   ______ _____ ______
  / ____// ___// ____/
 / / __  \__ \/ __/
/ /_/ / ___/ / /___
\____/ /____/_____/   attendance server
    "#
    );
}
