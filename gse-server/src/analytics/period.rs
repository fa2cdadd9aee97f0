//! 统计周期解析
//!
//! `period` 查询参数 → 闭区间日期范围。`today` 总是显式传入，便于测试。

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;
use shared::error::{AppError, AppResult, ErrorCode};

use crate::utils::time::{format_date, parse_date};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Today,
    ThisWeek,
    ThisMonth,
    Last3Months,
    Custom,
}

impl Period {
    /// 未知 / 缺省 → 本月
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(shared::util::vocab_key).as_deref() {
            Some("today") => Period::Today,
            Some("thisweek" | "week") => Period::ThisWeek,
            Some("last3months" | "quarter") => Period::Last3Months,
            _ => Period::ThisMonth,
        }
    }
}

/// 闭区间 [start, end]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub period: Period,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate, period: Period) -> Self {
        Self { start, end, period }
    }

    pub fn start_iso(&self) -> String {
        format_date(self.start)
    }

    pub fn end_iso(&self) -> String {
        format_date(self.end)
    }

    /// 按 `YYYY-MM-DD` 字符串比较
    pub fn contains_iso(&self, date_iso: &str) -> bool {
        let start = self.start_iso();
        let end = self.end_iso();
        date_iso >= start.as_str() && date_iso <= end.as_str()
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|d| *d <= self.end)
    }
}

fn month_bounds(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let first = today.with_day(1).unwrap_or(today);
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .unwrap_or(today);
    (first, last)
}

/// 解析周期；`startDate` / `endDate` 同时给出时覆盖 `period`
pub fn resolve(
    period: Option<&str>,
    start_date: Option<&str>,
    end_date: Option<&str>,
    today: NaiveDate,
) -> AppResult<DateRange> {
    if let (Some(start), Some(end)) = (start_date, end_date) {
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if end < start {
            return Err(AppError::new(ErrorCode::InvalidDateRange)
                .with_detail("startDate", format_date(start))
                .with_detail("endDate", format_date(end)));
        }
        return Ok(DateRange::new(start, end, Period::Custom));
    }

    let range = match Period::parse(period) {
        Period::Today => DateRange::new(today, today, Period::Today),
        Period::ThisWeek => {
            let offset = u64::from(today.weekday().num_days_from_sunday());
            let sunday = today.checked_sub_days(Days::new(offset)).unwrap_or(today);
            DateRange::new(sunday, today, Period::ThisWeek)
        }
        Period::Last3Months => {
            let start = today.checked_sub_months(Months::new(3)).unwrap_or(today);
            DateRange::new(start, today, Period::Last3Months)
        }
        Period::ThisMonth | Period::Custom => {
            let (first, last) = month_bounds(today);
            DateRange::new(first, last, Period::ThisMonth)
        }
    };
    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_today() {
        let r = resolve(Some("today"), None, None, d("2025-03-12")).unwrap();
        assert_eq!((r.start, r.end), (d("2025-03-12"), d("2025-03-12")));
        assert!(r.contains_iso("2025-03-12"));
        assert!(!r.contains_iso("2025-03-11"));
    }

    #[test]
    fn test_week_starts_sunday() {
        // 2025-03-12 是周三
        let r = resolve(Some("thisweek"), None, None, d("2025-03-12")).unwrap();
        assert_eq!(r.start, d("2025-03-09"));
        assert_eq!(r.end, d("2025-03-12"));
        assert_eq!(resolve(Some("week"), None, None, d("2025-03-12")).unwrap(), r);
    }

    #[test]
    fn test_month_is_full_calendar_month() {
        let r = resolve(Some("thismonth"), None, None, d("2024-02-10")).unwrap();
        assert_eq!((r.start, r.end), (d("2024-02-01"), d("2024-02-29")));
        // 缺省和未知值都是本月
        assert_eq!(resolve(None, None, None, d("2024-02-10")).unwrap(), r);
        assert_eq!(resolve(Some("fortnight"), None, None, d("2024-02-10")).unwrap(), r);
    }

    #[test]
    fn test_last_three_months() {
        let r = resolve(Some("quarter"), None, None, d("2025-05-31")).unwrap();
        assert_eq!(r.start, d("2025-02-28"));
        assert_eq!(r.end, d("2025-05-31"));
    }

    #[test]
    fn test_explicit_range_overrides_period() {
        let r = resolve(Some("today"), Some("2025-01-01"), Some("2025-01-31"), d("2025-03-12"))
            .unwrap();
        assert_eq!(r.period, Period::Custom);
        assert_eq!(r.days().count(), 31);

        let err = resolve(None, Some("2025-02-01"), Some("2025-01-01"), d("2025-03-12"))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidDateRange);
    }
}
