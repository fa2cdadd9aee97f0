//! 数据追踪与审计模块
//!
//! # 架构
//!
//! ```text
//! handler 变更成功
//!   └─ DataTracker::record(before, after)
//!        ├─ diff → data_change 表 (append-only)
//!        ├─ DashMap 统计
//!        └─ 重要操作 / 管理员操作 → audit_action 表
//!
//! 管理员撤销: service::revoke → 单事务 (audit_action + leave_request)
//! 后台任务:   compaction (归档到 archive/*.jsonl)、backup (backups/*.json)
//! ```

pub mod backup;
pub mod compaction;
pub mod diff;
pub mod service;
pub mod tracker;

pub use compaction::{COMPACT_TO, CompactionReport, MAX_TRACKED_CHANGES};
pub use service::{RevokeOutcome, revoke};
pub use tracker::{DataTracker, Tracked};
