//! System Settings Model (系统设置, single row)

use serde::{Deserialize, Serialize};

/// Working calendar and allowance settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SystemSettings {
    /// Weekend days, 0 = Sunday .. 6 = Saturday
    #[cfg_attr(feature = "db", sqlx(json))]
    pub weekend_days: Vec<u32>,
    /// HH:MM
    pub work_start_time: String,
    /// HH:MM
    pub work_end_time: String,
    pub late_grace_minutes: i64,
    /// Days per year
    pub default_absence_balance: f64,
    /// Hours per month
    pub default_late_hours_balance: f64,
    pub updated_at: i64,
    pub updated_by: Option<String>,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            weekend_days: vec![5, 6],
            work_start_time: "07:30".to_string(),
            work_end_time: "14:30".to_string(),
            late_grace_minutes: 10,
            default_absence_balance: 10.0,
            default_late_hours_balance: 6.0,
            updated_at: 0,
            updated_by: None,
        }
    }
}

/// Update settings payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub weekend_days: Option<Vec<u32>>,
    pub work_start_time: Option<String>,
    pub work_end_time: Option<String>,
    pub late_grace_minutes: Option<i64>,
    pub default_absence_balance: Option<f64>,
    pub default_late_hours_balance: Option<f64>,
}
