//! 时间工具函数 — 本地日期 / 时刻
//!
//! 考勤以学校本地日历为准：日期为 `YYYY-MM-DD`，时刻为 `HH:MM`。

use chrono::{Local, NaiveDate, NaiveTime, Timelike};

use super::{AppError, AppResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), DATE_FORMAT)
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 解析时刻字符串 (HH:MM)
pub fn parse_time(time: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), TIME_FORMAT)
        .map_err(|_| AppError::validation(format!("Invalid time format: {}", time)))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// 本地今天
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// 本地当前时刻（精确到分钟）
pub fn local_now_time() -> NaiveTime {
    let now = Local::now().time();
    NaiveTime::from_hms_opt(now.hour(), now.minute(), 0).unwrap_or(now)
}

/// 两个时刻之间的小时数（保留两位小数，跨越零点按 0 处理）
pub fn hours_between(start: NaiveTime, end: NaiveTime) -> f64 {
    if end <= start {
        return 0.0;
    }
    let minutes = (end - start).num_minutes() as f64;
    (minutes / 60.0 * 100.0).round() / 100.0
}

/// 周岁（按生日是否已过计算）
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> Option<u32> {
    use chrono::Datelike;

    if birthdate > today {
        return None;
    }
    let mut years = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}
