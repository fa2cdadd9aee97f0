//! Holiday Model (节假日)

use serde::{Deserialize, Serialize};

/// Holiday entity (soft delete via `is_active`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Holiday {
    pub id: String,
    pub name: String,
    pub name_ar: Option<String>,
    /// YYYY-MM-DD; recurring holidays match on month-day every year
    pub date: String,
    pub is_recurring: bool,
    pub is_active: bool,
    pub created_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub deleted_at: Option<i64>,
    pub deleted_by: Option<String>,
}

/// Create holiday payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayCreate {
    pub name: String,
    pub name_ar: Option<String>,
    pub date: String,
    #[serde(default)]
    pub is_recurring: bool,
}

/// Update holiday payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HolidayUpdate {
    pub name: Option<String>,
    pub name_ar: Option<String>,
    pub date: Option<String>,
    pub is_recurring: Option<bool>,
}
