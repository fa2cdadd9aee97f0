//! 旧版令牌 `gse_<teacherId>_<timestampMillis>`
//!
//! 旧客户端仍在发送此格式；JWT 为主，此格式仅在配置允许时接受。

use thiserror::Error;

pub const LEGACY_PREFIX: &str = "gse_";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegacyTokenError {
    #[error("malformed legacy token")]
    Malformed,
    #[error("legacy token timestamp is not numeric")]
    InvalidTimestamp,
    #[error("legacy token expired")]
    Expired,
}

/// 解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyToken {
    pub teacher_id: String,
    pub issued_at_millis: i64,
}

pub fn is_legacy_token(token: &str) -> bool {
    token.starts_with(LEGACY_PREFIX)
}

/// 解析 `gse_<id>_<ts>`
///
/// 按 `_` 切分：首段必须为 `gse`，末段为毫秒时间戳，中间各段拼回 id。
pub fn parse(token: &str) -> Result<LegacyToken, LegacyTokenError> {
    let parts: Vec<&str> = token.split('_').collect();
    if parts.len() < 3 || parts[0] != "gse" {
        return Err(LegacyTokenError::Malformed);
    }

    let ts_part = parts[parts.len() - 1];
    let issued_at_millis: i64 = ts_part
        .parse()
        .map_err(|_| LegacyTokenError::InvalidTimestamp)?;

    let teacher_id = parts[1..parts.len() - 1].join("_");
    if teacher_id.is_empty() {
        return Err(LegacyTokenError::Malformed);
    }

    Ok(LegacyToken {
        teacher_id,
        issued_at_millis,
    })
}

/// 解析并检查最长有效期
pub fn parse_with_max_age(
    token: &str,
    max_age_hours: Option<i64>,
    now_millis: i64,
) -> Result<LegacyToken, LegacyTokenError> {
    let parsed = parse(token)?;
    if let Some(hours) = max_age_hours
        && now_millis - parsed.issued_at_millis > hours * 3_600_000
    {
        return Err(LegacyTokenError::Expired);
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let t = parse("gse_6f1c2a90-7d1e-4b7a-9b1e-1f2d3c4b5a69_1717000000000").unwrap();
        assert_eq!(t.teacher_id, "6f1c2a90-7d1e-4b7a-9b1e-1f2d3c4b5a69");
        assert_eq!(t.issued_at_millis, 1_717_000_000_000);
    }

    #[test]
    fn test_parse_malformed() {
        assert_eq!(parse("gse_onlytwo"), Err(LegacyTokenError::Malformed));
        assert_eq!(parse("gse__123"), Err(LegacyTokenError::Malformed));
        assert_eq!(parse("abc_t1_123"), Err(LegacyTokenError::Malformed));
        assert_eq!(
            parse("gse_t1_notanumber"),
            Err(LegacyTokenError::InvalidTimestamp)
        );
    }

    #[test]
    fn test_max_age() {
        let now = 10 * 3_600_000;
        assert!(parse_with_max_age("gse_t1_0", Some(24), now).is_ok());
        assert_eq!(
            parse_with_max_age("gse_t1_0", Some(2), now),
            Err(LegacyTokenError::Expired)
        );
        assert!(parse_with_max_age("gse_t1_0", None, now).is_ok());
    }
}
