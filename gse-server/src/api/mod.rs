//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 登录、当前用户
//! - [`teachers`] - 教师管理、余额、通知
//! - [`attendance`] - 签到签退、考勤记录
//! - [`requests`] - 请假 / 迟到 / 早退申请
//! - [`holidays`] - 节假日
//! - [`subjects`] - 科目
//! - [`settings`] - 系统设置
//! - [`dashboard`] - 仪表盘
//! - [`analytics`] - 统计分析
//! - [`manager`] - 经理视图
//! - [`audit`] - 审计记录与撤销
//! - [`data_tracking`] - 数据追踪、备份、压缩

pub mod query;

pub mod auth;
pub mod health;

// Data models API
pub mod attendance;
pub mod holidays;
pub mod requests;
pub mod settings;
pub mod subjects;
pub mod teachers;

// Reporting
pub mod analytics;
pub mod dashboard;
pub mod manager;

// Audit
pub mod audit;
pub mod data_tracking;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
