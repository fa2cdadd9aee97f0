//! Attendance Model (考勤)

use serde::{Deserialize, Serialize};

/// Attendance status for one teacher-day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    EarlyLeave,
}

lenient_vocab!(AttendanceStatus, "attendance status", {
    Present => ["present", "ontime", "attended"],
    Absent => ["absent", "absence", "missing"],
    Late => ["late", "latearrival", "tardy"],
    EarlyLeave => ["earlyleave", "earlydeparture", "leftearly"],
});

/// Attendance record, at most one per (teacher, date)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AttendanceRecord {
    pub id: String,
    pub teacher_id: String,
    /// Local calendar date (YYYY-MM-DD)
    #[serde(rename = "dateISO", alias = "dateIso")]
    pub date_iso: String,
    /// HH:MM
    pub check_in: Option<String>,
    /// HH:MM
    pub check_out: Option<String>,
    pub total_hours: f64,
    pub status: AttendanceStatus,
    pub month: i64,
    pub year: i64,
    pub notes: Option<String>,
    /// Teacher id of whoever wrote the record (self on check-in)
    pub recorded_by: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Manual attendance entry (managers)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceCreate {
    pub teacher_id: String,
    #[serde(rename = "dateISO", alias = "dateIso", alias = "date")]
    pub date_iso: String,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

/// Attendance correction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceUpdate {
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub status: Option<AttendanceStatus>,
    pub notes: Option<String>,
}

/// Check-in / check-out payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckPayload {
    pub notes: Option<String>,
}
