//! 工作日日历：排除周末和有效节假日

use chrono::{Datelike, NaiveDate};
use shared::models::{Holiday, SystemSettings};
use std::collections::HashSet;

use super::period::DateRange;
use crate::utils::time::parse_date;

#[derive(Debug, Clone, Default)]
pub struct WorkCalendar {
    /// 0 = 周日 .. 6 = 周六
    weekend_days: HashSet<u32>,
    fixed: HashSet<NaiveDate>,
    /// 每年重复的 (月, 日)
    recurring: HashSet<(u32, u32)>,
}

impl WorkCalendar {
    /// 只使用 `is_active` 的节假日；日期无法解析的记录跳过
    pub fn new(settings: &SystemSettings, holidays: &[Holiday]) -> Self {
        let mut calendar = Self {
            weekend_days: settings.weekend_days.iter().copied().collect(),
            ..Default::default()
        };
        for holiday in holidays.iter().filter(|h| h.is_active) {
            let Ok(date) = parse_date(&holiday.date) else {
                tracing::warn!(holiday_id = %holiday.id, date = %holiday.date, "Skipping holiday with invalid date");
                continue;
            };
            if holiday.is_recurring {
                calendar.recurring.insert((date.month(), date.day()));
            } else {
                calendar.fixed.insert(date);
            }
        }
        calendar
    }

    pub fn is_weekend(&self, date: NaiveDate) -> bool {
        self.weekend_days
            .contains(&date.weekday().num_days_from_sunday())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.fixed.contains(&date) || self.recurring.contains(&(date.month(), date.day()))
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        !self.is_weekend(date) && !self.is_holiday(date)
    }

    /// 区间内的工作日，截止到 `today`
    pub fn working_days(&self, range: &DateRange, today: NaiveDate) -> Vec<NaiveDate> {
        range
            .days()
            .take_while(|d| *d <= today)
            .filter(|d| self.is_working_day(*d))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::period::Period;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn holiday(date: &str, recurring: bool, active: bool) -> Holiday {
        Holiday {
            id: format!("h-{date}"),
            name: "Holiday".into(),
            name_ar: None,
            date: date.into(),
            is_recurring: recurring,
            is_active: active,
            created_by: None,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
            deleted_by: None,
        }
    }

    #[test]
    fn test_default_weekend_is_friday_saturday() {
        let cal = WorkCalendar::new(&SystemSettings::default(), &[]);
        assert!(cal.is_weekend(d("2025-03-14"))); // Fri
        assert!(cal.is_weekend(d("2025-03-15"))); // Sat
        assert!(!cal.is_weekend(d("2025-03-16"))); // Sun
    }

    #[test]
    fn test_working_days_exclude_holidays_and_cap_at_today() {
        let holidays = vec![
            holiday("2025-03-10", false, true),
            holiday("2020-03-11", true, true),
            holiday("2025-03-12", false, false),
        ];
        let cal = WorkCalendar::new(&SystemSettings::default(), &holidays);
        let range = DateRange::new(d("2025-03-09"), d("2025-03-31"), Period::Custom);

        let days = cal.working_days(&range, d("2025-03-13"));
        // 9 Sun, 10 holiday, 11 recurring holiday, 12 (inactive holiday), 13 Thu
        assert_eq!(days, vec![d("2025-03-09"), d("2025-03-12"), d("2025-03-13")]);
    }

    #[test]
    fn test_future_range_has_no_working_days() {
        let cal = WorkCalendar::new(&SystemSettings::default(), &[]);
        let range = DateRange::new(d("2025-04-01"), d("2025-04-30"), Period::Custom);
        assert!(cal.working_days(&range, d("2025-03-31")).is_empty());
    }
}
