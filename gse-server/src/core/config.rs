use std::path::{Path, PathBuf};

use crate::auth::JwtConfig;
use crate::core::{Result, ServerError};

pub const DEFAULT_WORK_DIR: &str = "./data";

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (database / backups / archive / logs) |
/// | HTTP_PORT | 5000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | JWT_SECRET | 开发环境自动生成 | HS256 密钥 (至少 32 字符) |
/// | JWT_EXPIRATION_MINUTES | 1440 | 令牌有效期 |
/// | LEGACY_TOKENS_ENABLED | true | 是否接受旧版 `gse_` 令牌 |
/// | LEGACY_TOKEN_MAX_AGE_HOURS | - | 旧版令牌最长有效期 (小时) |
/// | REQUEST_TIMEOUT_MS | 30000 | 请求超时(毫秒) |
/// | COMPACTION_INTERVAL_SECS | 3600 | 追踪日志压缩周期 |
/// | BACKUP_RETENTION | 30 | 保留的备份数量 |
/// | ADMIN_EMAIL / ADMIN_PASSWORD | - | 空库时创建的初始管理员 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/srv/gse HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// JWT 认证配置
    pub jwt: JwtConfig,
    /// 运行环境: development | production
    pub environment: String,
    /// 是否接受旧版 `gse_<id>_<ts>` 令牌
    pub legacy_tokens_enabled: bool,
    /// 旧版令牌最长有效期 (小时)，None 表示不限制
    pub legacy_token_max_age_hours: Option<i64>,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 追踪日志压缩周期 (秒)
    pub compaction_interval_secs: u64,
    /// 保留的备份文件数量
    pub backup_retention: usize,
    /// 初始管理员
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 未设置的项使用默认值；只有 JWT 密钥缺失 (release) 或过短时失败
    pub fn from_env() -> Result<Self> {
        let jwt = JwtConfig::from_env().map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| DEFAULT_WORK_DIR.into()),
            http_port: env_parse("HTTP_PORT").unwrap_or(5000),
            jwt,
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            legacy_tokens_enabled: env_parse("LEGACY_TOKENS_ENABLED").unwrap_or(true),
            legacy_token_max_age_hours: env_parse("LEGACY_TOKEN_MAX_AGE_HOURS"),
            request_timeout_ms: env_parse("REQUEST_TIMEOUT_MS").unwrap_or(30_000),
            compaction_interval_secs: env_parse("COMPACTION_INTERVAL_SECS").unwrap_or(3600),
            backup_retention: env_parse("BACKUP_RETENTION").unwrap_or(30),
            admin_email: std::env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty()),
            admin_password: std::env::var("ADMIN_PASSWORD").ok().filter(|v| !v.is_empty()),
        })
    }

    /// 测试配置：固定密钥，指定工作目录
    pub fn for_tests(work_dir: impl Into<String>) -> Self {
        Self {
            work_dir: work_dir.into(),
            http_port: 0,
            jwt: JwtConfig {
                secret: "test-secret-key-that-is-long-enough-for-hs256".into(),
                expiration_minutes: 60,
                issuer: "gse-server".into(),
                audience: "gse-clients".into(),
            },
            environment: "test".into(),
            legacy_tokens_enabled: true,
            legacy_token_max_age_hours: None,
            request_timeout_ms: 30_000,
            compaction_interval_secs: 3600,
            backup_retention: 30,
            admin_email: None,
            admin_password: None,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn work_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir)
    }

    /// SQLite 数据库文件
    pub fn database_path(&self) -> PathBuf {
        self.work_path().join("database").join("gse.db")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.work_path().join("backups")
    }

    pub fn archive_dir(&self) -> PathBuf {
        self.work_path().join("archive")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.work_path().join("logs")
    }
}

/// 创建工作目录结构
///
/// ```text
/// work_dir/
/// ├── database/
/// ├── backups/
/// ├── archive/
/// └── logs/
/// ```
pub fn ensure_work_dir_structure(work_dir: &Path) -> std::io::Result<()> {
    for sub in ["database", "backups", "archive", "logs"] {
        std::fs::create_dir_all(work_dir.join(sub))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_work_dir_layout() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_tests(dir.path().to_string_lossy());
        ensure_work_dir_structure(dir.path()).unwrap();

        assert!(config.database_path().parent().unwrap().is_dir());
        assert!(config.backups_dir().is_dir());
        assert!(config.archive_dir().is_dir());
        assert!(config.logs_dir().is_dir());
        assert!(!config.is_production());
    }
}
