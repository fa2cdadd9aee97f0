//! Unified error codes for the GSE server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Teacher errors
//! - 4xxx: Attendance errors
//! - 5xxx: Request (leave/absence) errors
//! - 6xxx: Holiday errors
//! - 7xxx: Audit errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Auth ====================
    /// Not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials
    InvalidCredentials = 1002,
    /// Token expired
    TokenExpired = 1003,
    /// Token invalid
    TokenInvalid = 1004,
    /// Account disabled (inactive teacher)
    AccountDisabled = 1007,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,
    /// Cannot modify admin
    CannotModifyAdmin = 2004,
    /// Cannot delete admin
    CannotDeleteAdmin = 2005,
    /// Cannot decide own request
    SelfApprovalForbidden = 2006,

    // ==================== 3xxx: Teacher ====================
    /// Teacher not found
    TeacherNotFound = 3001,
    /// Email already registered
    EmailAlreadyExists = 3002,
    /// Cannot delete self
    TeacherCannotDeleteSelf = 3003,

    // ==================== 4xxx: Attendance ====================
    /// Attendance record not found
    AttendanceNotFound = 4001,
    /// Already checked in today
    AlreadyCheckedIn = 4002,
    /// No check-in for today
    NotCheckedIn = 4003,
    /// Already checked out today
    AlreadyCheckedOut = 4004,
    /// Record already exists for teacher and date
    AttendanceExists = 4005,

    // ==================== 5xxx: Request ====================
    /// Request not found
    RequestNotFound = 5001,
    /// Status transition not allowed
    InvalidStatusTransition = 5002,
    /// End date before start date
    InvalidDateRange = 5003,

    // ==================== 6xxx: Holiday ====================
    /// Holiday not found
    HolidayNotFound = 6001,
    /// Active holiday already exists on date
    HolidayDateExists = 6002,

    // ==================== 7xxx: Audit ====================
    /// Audit action not found
    AuditActionNotFound = 7001,
    /// Audit action already revoked
    ActionAlreadyRevoked = 7002,
    /// Audit action is not revocable
    ActionNotRevocable = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Operation timeout
    TimeoutError = 9004,
    /// Configuration error
    ConfigError = 9005,
    /// Storage (filesystem) unavailable
    StorageError = 9401,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::AccountDisabled => "Account is disabled",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",
            ErrorCode::CannotModifyAdmin => "Cannot modify administrator user",
            ErrorCode::CannotDeleteAdmin => "Cannot delete administrator user",
            ErrorCode::SelfApprovalForbidden => "Cannot approve or reject your own request",

            // Teacher
            ErrorCode::TeacherNotFound => "Teacher not found",
            ErrorCode::EmailAlreadyExists => "Email already exists",
            ErrorCode::TeacherCannotDeleteSelf => "Cannot delete your own account",

            // Attendance
            ErrorCode::AttendanceNotFound => "Attendance record not found",
            ErrorCode::AlreadyCheckedIn => "Already checked in today",
            ErrorCode::NotCheckedIn => "No check-in recorded for today",
            ErrorCode::AlreadyCheckedOut => "Already checked out today",
            ErrorCode::AttendanceExists => "Attendance record already exists for this date",

            // Request
            ErrorCode::RequestNotFound => "Request not found",
            ErrorCode::InvalidStatusTransition => "Request status transition is not allowed",
            ErrorCode::InvalidDateRange => "End date must not be before start date",

            // Holiday
            ErrorCode::HolidayNotFound => "Holiday not found",
            ErrorCode::HolidayDateExists => "A holiday already exists on this date",

            // Audit
            ErrorCode::AuditActionNotFound => "Audit action not found",
            ErrorCode::ActionAlreadyRevoked => "Action has already been revoked",
            ErrorCode::ActionNotRevocable => "Action cannot be revoked",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::TimeoutError => "Operation timed out",
            ErrorCode::ConfigError => "Configuration error",
            ErrorCode::StorageError => "Storage unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1007 => Ok(ErrorCode::AccountDisabled),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),
            2004 => Ok(ErrorCode::CannotModifyAdmin),
            2005 => Ok(ErrorCode::CannotDeleteAdmin),
            2006 => Ok(ErrorCode::SelfApprovalForbidden),

            // Teacher
            3001 => Ok(ErrorCode::TeacherNotFound),
            3002 => Ok(ErrorCode::EmailAlreadyExists),
            3003 => Ok(ErrorCode::TeacherCannotDeleteSelf),

            // Attendance
            4001 => Ok(ErrorCode::AttendanceNotFound),
            4002 => Ok(ErrorCode::AlreadyCheckedIn),
            4003 => Ok(ErrorCode::NotCheckedIn),
            4004 => Ok(ErrorCode::AlreadyCheckedOut),
            4005 => Ok(ErrorCode::AttendanceExists),

            // Request
            5001 => Ok(ErrorCode::RequestNotFound),
            5002 => Ok(ErrorCode::InvalidStatusTransition),
            5003 => Ok(ErrorCode::InvalidDateRange),

            // Holiday
            6001 => Ok(ErrorCode::HolidayNotFound),
            6002 => Ok(ErrorCode::HolidayDateExists),

            // Audit
            7001 => Ok(ErrorCode::AuditActionNotFound),
            7002 => Ok(ErrorCode::ActionAlreadyRevoked),
            7003 => Ok(ErrorCode::ActionNotRevocable),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9004 => Ok(ErrorCode::TimeoutError),
            9005 => Ok(ErrorCode::ConfigError),
            9401 => Ok(ErrorCode::StorageError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::EmailAlreadyExists.code(), 3002);
        assert_eq!(ErrorCode::AuditActionNotFound.code(), 7001);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_round_trip() {
        for code in [
            ErrorCode::NotAuthenticated,
            ErrorCode::SelfApprovalForbidden,
            ErrorCode::AlreadyCheckedIn,
            ErrorCode::InvalidStatusTransition,
            ErrorCode::HolidayDateExists,
            ErrorCode::ActionNotRevocable,
            ErrorCode::StorageError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::RequestNotFound).unwrap();
        assert_eq!(json, "5001");
        let back: ErrorCode = serde_json::from_str("7002").unwrap();
        assert_eq!(back, ErrorCode::ActionAlreadyRevoked);
        assert!(serde_json::from_str::<ErrorCode>("12345").is_err());
    }
}
