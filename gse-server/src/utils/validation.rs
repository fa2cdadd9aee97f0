//! Input validation helpers
//!
//! Centralized text length constants and validation functions.
//! SQLite TEXT has no built-in length enforcement.

use crate::utils::time::{parse_date, parse_time};
use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Person / holiday names
pub const MAX_NAME_LEN: usize = 200;

/// Notes, reasons (request reason, rejection reason, attendance notes)
pub const MAX_NOTE_LEN: usize = 500;

/// Short identifiers: phone, subject
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Passwords (before hashing)
pub const MAX_PASSWORD_LEN: usize = 128;
pub const MIN_PASSWORD_LEN: usize = 6;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

/// Minimal structural email check (one `@`, non-empty local part, dotted domain)
pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_required_text(email, "email", MAX_EMAIL_LEN)?;
    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(AppError::validation(format!("Invalid email: {email}")).with_detail("field", "email"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .with_detail("field", "password"));
    }
    validate_required_text(password, "password", MAX_PASSWORD_LEN)
}

/// Optional `YYYY-MM-DD` field
pub fn validate_optional_date(value: &Option<String>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value {
        parse_date(v).map_err(|e| e.with_detail("field", field))?;
    }
    Ok(())
}

/// Optional `HH:MM` field
pub fn validate_optional_time(value: &Option<String>, field: &str) -> Result<(), AppError> {
    if let Some(v) = value {
        parse_time(v).map_err(|e| e.with_detail("field", field))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Amal", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        assert!(validate_required_text(&"x".repeat(201), "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("amal@school.test").is_ok());
        assert!(validate_email("amal@school").is_err());
        assert!(validate_email("amal.school.test").is_err());
        assert!(validate_email("a b@school.test").is_err());
        assert!(validate_email("a@b@school.test").is_err());
    }

    #[test]
    fn test_optional_date_and_time() {
        assert!(validate_optional_date(&None, "birthdate").is_ok());
        assert!(validate_optional_date(&Some("1990-01-31".into()), "birthdate").is_ok());
        assert!(validate_optional_date(&Some("1990-13-01".into()), "birthdate").is_err());
        assert!(validate_optional_time(&Some("07:30".into()), "checkIn").is_ok());
        assert!(validate_optional_time(&Some("7h30".into()), "checkIn").is_err());
    }
}
