//! Audit trail and data-tracking models (审计 / 数据追踪)

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Tracked mutation kind (closed set, not free text)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum ActionKind {
    CreateTeacher,
    UpdateTeacher,
    DeleteTeacher,
    CreateRequest,
    ApproveRequest,
    RejectRequest,
    CancelRequest,
    CheckIn,
    CheckOut,
    CreateAttendance,
    UpdateAttendance,
    CreateHoliday,
    UpdateHoliday,
    DeleteHoliday,
    UpdateSettings,
    RevokeAction,
}

lenient_vocab!(ActionKind, "action", {
    CreateTeacher => ["createteacher", "addteacher"],
    UpdateTeacher => ["updateteacher", "editteacher"],
    DeleteTeacher => ["deleteteacher", "removeteacher"],
    CreateRequest => ["createrequest", "submitrequest"],
    ApproveRequest => ["approverequest"],
    RejectRequest => ["rejectrequest"],
    CancelRequest => ["cancelrequest", "withdrawrequest"],
    CheckIn => ["checkin"],
    CheckOut => ["checkout"],
    CreateAttendance => ["createattendance", "recordattendance"],
    UpdateAttendance => ["updateattendance"],
    CreateHoliday => ["createholiday", "addholiday"],
    UpdateHoliday => ["updateholiday"],
    DeleteHoliday => ["deleteholiday"],
    UpdateSettings => ["updatesettings"],
    RevokeAction => ["revokeaction"],
});

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::CreateTeacher => "CREATE_TEACHER",
            ActionKind::UpdateTeacher => "UPDATE_TEACHER",
            ActionKind::DeleteTeacher => "DELETE_TEACHER",
            ActionKind::CreateRequest => "CREATE_REQUEST",
            ActionKind::ApproveRequest => "APPROVE_REQUEST",
            ActionKind::RejectRequest => "REJECT_REQUEST",
            ActionKind::CancelRequest => "CANCEL_REQUEST",
            ActionKind::CheckIn => "CHECK_IN",
            ActionKind::CheckOut => "CHECK_OUT",
            ActionKind::CreateAttendance => "CREATE_ATTENDANCE",
            ActionKind::UpdateAttendance => "UPDATE_ATTENDANCE",
            ActionKind::CreateHoliday => "CREATE_HOLIDAY",
            ActionKind::UpdateHoliday => "UPDATE_HOLIDAY",
            ActionKind::DeleteHoliday => "DELETE_HOLIDAY",
            ActionKind::UpdateSettings => "UPDATE_SETTINGS",
            ActionKind::RevokeAction => "REVOKE_ACTION",
        }
    }

    /// Always mirrored into the audit trail, whatever the actor's role
    pub const fn is_significant(self) -> bool {
        matches!(
            self,
            ActionKind::CreateTeacher
                | ActionKind::UpdateTeacher
                | ActionKind::DeleteTeacher
                | ActionKind::ApproveRequest
                | ActionKind::RejectRequest
                | ActionKind::UpdateAttendance
                | ActionKind::DeleteHoliday
                | ActionKind::UpdateSettings
                | ActionKind::RevokeAction
        )
    }

    /// Decisions an admin may undo from the audit trail
    pub const fn is_revocable(self) -> bool {
        matches!(self, ActionKind::ApproveRequest | ActionKind::RejectRequest)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of entity a change targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "snake_case"))]
pub enum TargetType {
    Teacher,
    Attendance,
    Request,
    Holiday,
    Settings,
    AuditAction,
}

lenient_vocab!(TargetType, "target type", {
    Teacher => ["teacher", "teachers", "employee"],
    Attendance => ["attendance"],
    Request => ["request", "requests", "leaverequest"],
    Holiday => ["holiday", "holidays"],
    Settings => ["settings", "systemsettings"],
    AuditAction => ["auditaction", "audit"],
});

impl TargetType {
    pub const fn as_str(self) -> &'static str {
        match self {
            TargetType::Teacher => "teacher",
            TargetType::Attendance => "attendance",
            TargetType::Request => "request",
            TargetType::Holiday => "holiday",
            TargetType::Settings => "settings",
            TargetType::AuditAction => "audit_action",
        }
    }
}

/// 字段变更记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    /// 字段名 (dotted path for nested objects)
    pub field: String,
    /// 变更前的值
    pub from: Value,
    /// 变更后的值
    pub to: Value,
}

/// Data-tracking log entry (one per tracked mutation)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DataChange {
    pub change_id: String,
    pub timestamp: i64,
    pub user_id: String,
    pub user_role: String,
    pub action: ActionKind,
    pub target_type: TargetType,
    pub target_id: String,
    #[cfg_attr(feature = "db", sqlx(json))]
    pub changes: Vec<FieldChange>,
    pub original_data: Option<Value>,
    pub new_data: Option<Value>,
}

/// Audit trail record for a significant action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AuditActionRecord {
    pub action_id: String,
    pub timestamp: i64,
    pub user_id: String,
    pub user_role: String,
    pub user_name: String,
    pub action: ActionKind,
    pub target_type: TargetType,
    pub target_id: String,
    pub original_data: Option<Value>,
    pub new_data: Option<Value>,
    pub can_be_revoked: bool,
    pub is_revoked: bool,
    pub revoked_by: Option<String>,
    pub revoked_at: Option<i64>,
    pub revocation_reason: Option<String>,
}

/// Revocation payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokePayload {
    pub reason: Option<String>,
}

/// Data-tracking statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingStatistics {
    pub total_changes: u64,
    pub by_action: BTreeMap<String, u64>,
    pub by_user: BTreeMap<String, u64>,
    pub by_target_type: BTreeMap<String, u64>,
    pub last_change_at: Option<i64>,
    /// Rows moved to archive files by compaction
    pub archived_total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        assert_eq!(
            serde_json::to_string(&ActionKind::ApproveRequest).unwrap(),
            "\"APPROVE_REQUEST\""
        );
        let parsed: ActionKind = serde_json::from_str("\"approve_request\"").unwrap();
        assert_eq!(parsed, ActionKind::ApproveRequest);
        assert_eq!(ActionKind::RevokeAction.to_string(), "REVOKE_ACTION");
    }

    #[test]
    fn test_significance_and_revocability() {
        assert!(ActionKind::ApproveRequest.is_significant());
        assert!(ActionKind::ApproveRequest.is_revocable());
        assert!(ActionKind::RejectRequest.is_revocable());
        assert!(!ActionKind::DeleteTeacher.is_revocable());
        assert!(!ActionKind::CheckIn.is_significant());
        assert!(!ActionKind::CreateRequest.is_significant());
    }

    #[test]
    fn test_target_type_aliases() {
        assert_eq!("teachers".parse::<TargetType>().unwrap(), TargetType::Teacher);
        assert_eq!(
            serde_json::to_string(&TargetType::AuditAction).unwrap(),
            "\"audit_action\""
        );
    }
}
