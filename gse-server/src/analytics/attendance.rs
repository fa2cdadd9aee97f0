//! 考勤统计（纯函数）

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use shared::models::{AttendanceRecord, AttendanceStatus, Teacher};
use std::collections::{BTreeMap, HashMap};

use super::period::{DateRange, Period};
use super::{percent, round1};
use crate::utils::time::{format_date, parse_date};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub present: u64,
    pub late: u64,
    pub absent: u64,
    pub early_leave: u64,
}

impl StatusCounts {
    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::EarlyLeave => self.early_leave += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.present + self.late + self.absent + self.early_leave
    }

    /// 到校（出勤、迟到、早退都算到过）
    pub fn attended(&self) -> u64 {
        self.present + self.late + self.early_leave
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a AttendanceRecord>) -> Self {
        let mut counts = Self::default();
        for r in records {
            counts.add(r.status);
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub period: Period,
    pub start_date: String,
    pub end_date: String,
    pub total_teachers: u64,
    pub total_days: u64,
    pub total_records: u64,
    pub present_count: u64,
    pub late_count: u64,
    pub absent_count: u64,
    pub early_leave_count: u64,
    /// round1(present / (teachers × days) × 100)
    pub average_attendance: f64,
    /// round1(present / (present + late) × 100)
    pub punctuality_rate: f64,
}

/// `records` 只取区间内的记录
pub fn summarize(
    records: &[AttendanceRecord],
    total_teachers: usize,
    total_days: usize,
    range: &DateRange,
) -> AttendanceSummary {
    let counts = StatusCounts::from_records(records.iter().filter(|r| range.contains_iso(&r.date_iso)));
    let expected = (total_teachers as u64) * (total_days as u64);

    AttendanceSummary {
        period: range.period,
        start_date: range.start_iso(),
        end_date: range.end_iso(),
        total_teachers: total_teachers as u64,
        total_days: total_days as u64,
        total_records: counts.total(),
        present_count: counts.present,
        late_count: counts.late,
        absent_count: counts.absent,
        early_leave_count: counts.early_leave,
        average_attendance: percent(counts.present, expected),
        punctuality_rate: percent(counts.present, counts.present + counts.late),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub date: String,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total: u64,
}

/// 每日计数，区间内每天一个点（截止到 today）
pub fn trend(records: &[AttendanceRecord], range: &DateRange, today: NaiveDate) -> Vec<TrendPoint> {
    let mut by_day: HashMap<&str, StatusCounts> = HashMap::new();
    for r in records.iter().filter(|r| range.contains_iso(&r.date_iso)) {
        by_day.entry(r.date_iso.as_str()).or_default().add(r.status);
    }

    range
        .days()
        .take_while(|d| *d <= today)
        .map(|day| {
            let date = format_date(day);
            let counts = by_day.get(date.as_str()).copied().unwrap_or_default();
            TrendPoint {
                total: counts.total(),
                date,
                counts,
            }
        })
        .collect()
}

const WEEKDAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekdayBucket {
    /// 0 = 周日
    pub day: u32,
    pub name: &'static str,
    pub absences: u64,
    pub lates: u64,
    pub early_leaves: u64,
}

/// 按星期几统计缺勤 / 迟到 / 早退
pub fn weekday_breakdown(records: &[AttendanceRecord], range: &DateRange) -> Vec<WeekdayBucket> {
    let mut buckets: Vec<WeekdayBucket> = WEEKDAY_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| WeekdayBucket {
            day: i as u32,
            name: *name,
            absences: 0,
            lates: 0,
            early_leaves: 0,
        })
        .collect();

    for r in records.iter().filter(|r| range.contains_iso(&r.date_iso)) {
        let Ok(date) = parse_date(&r.date_iso) else {
            continue;
        };
        let bucket = &mut buckets[date.weekday().num_days_from_sunday() as usize];
        match r.status {
            AttendanceStatus::Absent => bucket.absences += 1,
            AttendanceStatus::Late => bucket.lates += 1,
            AttendanceStatus::EarlyLeave => bucket.early_leaves += 1,
            AttendanceStatus::Present => {}
        }
    }
    buckets
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentSummary {
    pub subject: String,
    pub teachers: u64,
    #[serde(flatten)]
    pub counts: StatusCounts,
    /// round1(attended / (teachers × days) × 100)
    pub attendance_rate: f64,
}

pub const UNASSIGNED_SUBJECT: &str = "Unassigned";

/// 按科目汇总；`teachers` 为在职教师
pub fn department_summary(
    teachers: &[Teacher],
    records: &[AttendanceRecord],
    total_days: usize,
    range: &DateRange,
) -> Vec<DepartmentSummary> {
    let subject_of = |t: &Teacher| {
        t.subject
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(UNASSIGNED_SUBJECT)
            .to_string()
    };

    let teacher_subject: HashMap<&str, String> =
        teachers.iter().map(|t| (t.id.as_str(), subject_of(t))).collect();

    let mut departments: BTreeMap<String, (u64, StatusCounts)> = BTreeMap::new();
    for subject in teacher_subject.values() {
        departments.entry(subject.clone()).or_default().0 += 1;
    }
    for r in records.iter().filter(|r| range.contains_iso(&r.date_iso)) {
        if let Some(subject) = teacher_subject.get(r.teacher_id.as_str())
            && let Some(entry) = departments.get_mut(subject)
        {
            entry.1.add(r.status);
        }
    }

    departments
        .into_iter()
        .map(|(subject, (teachers, counts))| DepartmentSummary {
            attendance_rate: percent(counts.attended(), teachers * total_days as u64),
            subject,
            teachers,
            counts,
        })
        .collect()
}

/// 区间内总工时
pub fn total_hours(records: &[AttendanceRecord]) -> f64 {
    round1(records.iter().map(|r| r.total_hours).sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Role, TeacherStatus, WorkType};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(teacher: &str, date: &str, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: format!("{teacher}-{date}"),
            teacher_id: teacher.into(),
            date_iso: date.into(),
            check_in: None,
            check_out: None,
            total_hours: 0.0,
            status,
            month: 3,
            year: 2025,
            notes: None,
            recorded_by: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn teacher(id: &str, subject: Option<&str>) -> Teacher {
        Teacher {
            id: id.into(),
            name: id.into(),
            email: format!("{id}@school.test"),
            phone: None,
            subject: subject.map(Into::into),
            work_type: WorkType::FullTime,
            birthdate: None,
            employment_date: None,
            password_hash: String::new(),
            role: Role::Employee,
            role_level: 1,
            authorities: vec![],
            status: TeacherStatus::Active,
            absence_balance: 10.0,
            late_hours_balance: 6.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn march() -> DateRange {
        DateRange::new(d("2025-03-01"), d("2025-03-31"), Period::ThisMonth)
    }

    #[test]
    fn test_average_attendance_formula() {
        let records = vec![
            rec("t1", "2025-03-02", AttendanceStatus::Present),
            rec("t1", "2025-03-03", AttendanceStatus::Present),
            rec("t2", "2025-03-02", AttendanceStatus::Late),
            rec("t2", "2025-03-03", AttendanceStatus::Present),
            rec("t2", "2025-02-28", AttendanceStatus::Present), // 区间外
        ];
        let s = summarize(&records, 2, 3, &march());
        assert_eq!(s.present_count, 3);
        assert_eq!(s.late_count, 1);
        // 3 / (2 × 3) × 100 = 50.0
        assert_eq!(s.average_attendance, 50.0);
        assert_eq!(s.punctuality_rate, 75.0);
        assert_eq!(s.total_records, 4);
    }

    #[test]
    fn test_average_attendance_rounds_to_one_decimal() {
        let records = vec![rec("t1", "2025-03-02", AttendanceStatus::Present)];
        let s = summarize(&records, 3, 1, &march());
        assert_eq!(s.average_attendance, 33.3);
    }

    #[test]
    fn test_zero_guards() {
        let records = vec![rec("t1", "2025-03-02", AttendanceStatus::Present)];
        assert_eq!(summarize(&records, 0, 5, &march()).average_attendance, 0.0);
        assert_eq!(summarize(&records, 5, 0, &march()).average_attendance, 0.0);
        assert_eq!(summarize(&[], 5, 5, &march()).punctuality_rate, 0.0);
    }

    #[test]
    fn test_trend_fills_empty_days() {
        let records = vec![
            rec("t1", "2025-03-02", AttendanceStatus::Present),
            rec("t2", "2025-03-02", AttendanceStatus::Absent),
        ];
        let points = trend(&records, &march(), d("2025-03-03"));
        assert_eq!(points.len(), 3);
        assert_eq!(points[1].date, "2025-03-02");
        assert_eq!(points[1].total, 2);
        assert_eq!(points[1].counts.absent, 1);
        assert_eq!(points[2].total, 0);
    }

    #[test]
    fn test_weekday_buckets() {
        let records = vec![
            rec("t1", "2025-03-02", AttendanceStatus::Absent), // Sun
            rec("t2", "2025-03-02", AttendanceStatus::Late),
            rec("t1", "2025-03-04", AttendanceStatus::EarlyLeave), // Tue
        ];
        let buckets = weekday_breakdown(&records, &march());
        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].name, "Sunday");
        assert_eq!((buckets[0].absences, buckets[0].lates), (1, 1));
        assert_eq!(buckets[2].early_leaves, 1);
    }

    #[test]
    fn test_department_summary() {
        let teachers = vec![
            teacher("t1", Some("Math")),
            teacher("t2", Some("Math")),
            teacher("t3", None),
        ];
        let records = vec![
            rec("t1", "2025-03-02", AttendanceStatus::Present),
            rec("t2", "2025-03-02", AttendanceStatus::Late),
            rec("t3", "2025-03-02", AttendanceStatus::Absent),
        ];
        let depts = department_summary(&teachers, &records, 1, &march());
        assert_eq!(depts.len(), 2);
        let math = depts.iter().find(|d| d.subject == "Math").unwrap();
        assert_eq!(math.teachers, 2);
        assert_eq!(math.attendance_rate, 100.0);
        let other = depts.iter().find(|d| d.subject == UNASSIGNED_SUBJECT).unwrap();
        assert_eq!(other.attendance_rate, 0.0);
    }
}
