//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Teacher errors (3xxx)
    Teacher,
    /// Attendance errors (4xxx)
    Attendance,
    /// Request errors (5xxx)
    Request,
    /// Holiday errors (6xxx)
    Holiday,
    /// Audit errors (7xxx)
    Audit,
    /// System errors (8xxx, 9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Teacher,
            4000..5000 => Self::Attendance,
            5000..6000 => Self::Request,
            6000..7000 => Self::Holiday,
            7000..8000 => Self::Audit,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Teacher => "teacher",
            Self::Attendance => "attendance",
            Self::Request => "request",
            Self::Holiday => "holiday",
            Self::Audit => "audit",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1004), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2006), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3002), ErrorCategory::Teacher);
        assert_eq!(ErrorCategory::from_code(4002), ErrorCategory::Attendance);
        assert_eq!(ErrorCategory::from_code(5002), ErrorCategory::Request);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Holiday);
        assert_eq!(ErrorCategory::from_code(7003), ErrorCategory::Audit);
        assert_eq!(ErrorCategory::from_code(9002), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::DatabaseError.category(), ErrorCategory::System);
        assert_eq!(
            ErrorCode::ActionAlreadyRevoked.category(),
            ErrorCategory::Audit
        );
        assert_eq!(ErrorCategory::Holiday.name(), "holiday");
    }
}
