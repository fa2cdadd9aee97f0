/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a new UUID v4 resource id
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fold a free-form vocabulary value into a comparison key.
///
/// Lowercases and drops everything that is not alphanumeric, so
/// `"Early Leave"`, `"early_leave"`, `"earlyLeave"` and `"EARLY-LEAVE"`
/// all collapse to `"earlyleave"`.
pub fn vocab_key(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vocab_key_folds_casings() {
        assert_eq!(vocab_key("Early Leave"), "earlyleave");
        assert_eq!(vocab_key("early_leave"), "earlyleave");
        assert_eq!(vocab_key("earlyLeave"), "earlyleave");
        assert_eq!(vocab_key("  APPROVED "), "approved");
    }

    #[test]
    fn test_new_id_is_uuid() {
        let id = new_id();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }
}
