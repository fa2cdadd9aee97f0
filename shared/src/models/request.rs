//! Leave / Absence Request Model (请假申请)

use serde::{Deserialize, Serialize};

/// Request type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "camelCase"))]
pub enum RequestType {
    Absence,
    Late,
    EarlyLeave,
}

lenient_vocab!(RequestType, "request type", {
    Absence => ["absence", "absent", "leave", "dayoff"],
    Late => ["late", "latearrival", "lateness"],
    EarlyLeave => ["earlyleave", "earlydeparture", "early"],
});

impl RequestType {
    /// Late and early-leave durations are hours; absences are days
    pub const fn is_hourly(self) -> bool {
        matches!(self, RequestType::Late | RequestType::EarlyLeave)
    }
}

/// Request status
///
/// | from               | to                 | via                    |
/// |--------------------|--------------------|------------------------|
/// | Pending            | Approved, Rejected | approve / reject       |
/// | Pending            | Revoked            | requester withdraws    |
/// | Approved, Rejected | Pending            | audit revocation only  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Revoked,
}

lenient_vocab!(RequestStatus, "request status", {
    Pending => ["pending", "waiting", "submitted"],
    Approved => ["approved", "accepted", "accept", "approve"],
    Rejected => ["rejected", "declined", "denied", "reject"],
    Revoked => ["revoked", "cancelled", "canceled", "withdrawn"],
});

/// Who drives a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOrigin {
    /// Normal request workflow (approve / reject / withdraw)
    Workflow,
    /// Reverting a decision through the audit log
    AuditRevocation,
}

impl RequestStatus {
    pub fn can_transition(self, to: RequestStatus, origin: TransitionOrigin) -> bool {
        use RequestStatus::*;
        match (self, to, origin) {
            (Pending, Approved | Rejected | Revoked, TransitionOrigin::Workflow) => true,
            (Approved | Rejected, Pending, TransitionOrigin::AuditRevocation) => true,
            _ => false,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Revoked => "revoked",
        }
    }
}

/// Leave / absence request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LeaveRequest {
    pub id: String,
    pub teacher_id: String,
    pub teacher_name: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub start_date: String,
    pub end_date: String,
    /// Days for absences, hours for late / early leave
    pub duration: f64,
    pub reason: Option<String>,
    pub approved_by: Option<String>,
    pub approver_name: Option<String>,
    pub approved_at: Option<i64>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub rejected_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create request payload
///
/// `teacherId` defaults to the caller; managers may file on behalf of others.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCreate {
    pub teacher_id: Option<String>,
    #[serde(rename = "type", alias = "requestType")]
    pub request_type: RequestType,
    pub start_date: String,
    pub end_date: Option<String>,
    pub duration: Option<f64>,
    pub reason: Option<String>,
}

/// Reject payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectPayload {
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_aliases_fold() {
        for raw in ["\"Accepted\"", "\"APPROVED\"", "\"approved\""] {
            let s: RequestStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(s, RequestStatus::Approved);
        }
        assert_eq!(
            serde_json::to_string(&RequestStatus::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn test_type_aliases_fold() {
        for raw in ["earlyLeave", "early_leave", "Early Leave"] {
            assert_eq!(raw.parse::<RequestType>().unwrap(), RequestType::EarlyLeave);
        }
        assert_eq!(
            serde_json::to_string(&RequestType::EarlyLeave).unwrap(),
            "\"earlyLeave\""
        );
    }

    #[test]
    fn test_transition_table() {
        use RequestStatus::*;
        use TransitionOrigin::*;

        assert!(Pending.can_transition(Approved, Workflow));
        assert!(Pending.can_transition(Rejected, Workflow));
        assert!(Pending.can_transition(Revoked, Workflow));
        assert!(Approved.can_transition(Pending, AuditRevocation));
        assert!(Rejected.can_transition(Pending, AuditRevocation));

        assert!(!Approved.can_transition(Rejected, Workflow));
        assert!(!Approved.can_transition(Pending, Workflow));
        assert!(!Revoked.can_transition(Pending, AuditRevocation));
        assert!(!Pending.can_transition(Pending, AuditRevocation));
    }

    #[test]
    fn test_create_payload_type_field() {
        let create: RequestCreate = serde_json::from_str(
            r#"{"type":"Late Arrival","startDate":"2025-01-05","duration":1.5}"#,
        )
        .unwrap();
        assert_eq!(create.request_type, RequestType::Late);
        assert!(create.request_type.is_hourly());
    }
}
