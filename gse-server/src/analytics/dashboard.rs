//! 仪表盘：当天快照、提醒、待办

use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;
use shared::models::{
    AttendanceRecord, AttendanceStatus, LeaveRequest, RequestStatus, RequestType, Role, Teacher,
};
use std::collections::{HashMap, HashSet};

use super::attendance::StatusCounts;
use super::calendar::WorkCalendar;
use super::percent;
use super::teacher::balance;
use crate::utils::time::format_date;

/// 本月迟到次数达到此值即提醒
pub const FREQUENT_LATE_THRESHOLD: u64 = 3;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub date: String,
    pub is_working_day: bool,
    pub total_teachers: u64,
    pub active_teachers: u64,
    pub checked_in: u64,
    #[serde(flatten)]
    pub today: StatusCounts,
    /// round1(attended today / active × 100)
    pub attendance_rate: f64,
    pub pending_requests: u64,
}

/// `teachers` 为全部教师，`today_records` 为当天记录
pub fn overview(
    teachers: &[Teacher],
    today_records: &[AttendanceRecord],
    pending_requests: usize,
    calendar: &WorkCalendar,
    today: NaiveDate,
) -> Overview {
    let active: HashSet<&str> = teachers
        .iter()
        .filter(|t| t.is_active())
        .map(|t| t.id.as_str())
        .collect();
    let counts = StatusCounts::from_records(
        today_records
            .iter()
            .filter(|r| active.contains(r.teacher_id.as_str())),
    );

    Overview {
        date: format_date(today),
        is_working_day: calendar.is_working_day(today),
        total_teachers: teachers.len() as u64,
        active_teachers: active.len() as u64,
        checked_in: today_records
            .iter()
            .filter(|r| r.check_in.is_some())
            .count() as u64,
        attendance_rate: percent(counts.attended(), active.len() as u64),
        today: counts,
        pending_requests: pending_requests as u64,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickStats {
    pub date: String,
    pub checked_in: u64,
    pub not_checked_in: u64,
    pub late: u64,
    pub on_leave: u64,
    pub pending_requests: u64,
}

pub fn quick_stats(
    active_teachers: &[Teacher],
    today_records: &[AttendanceRecord],
    requests: &[LeaveRequest],
    today: NaiveDate,
) -> QuickStats {
    let today_iso = format_date(today);
    let checked: HashSet<&str> = today_records
        .iter()
        .filter(|r| r.check_in.is_some())
        .map(|r| r.teacher_id.as_str())
        .collect();
    let checked_in = active_teachers
        .iter()
        .filter(|t| checked.contains(t.id.as_str()))
        .count() as u64;

    QuickStats {
        checked_in,
        not_checked_in: active_teachers.len() as u64 - checked_in,
        late: today_records
            .iter()
            .filter(|r| r.status == AttendanceStatus::Late)
            .count() as u64,
        on_leave: approved_absences_on(requests, &today_iso)
            .map(|r| r.teacher_id.as_str())
            .collect::<HashSet<_>>()
            .len() as u64,
        pending_requests: requests
            .iter()
            .filter(|r| r.status == RequestStatus::Pending)
            .count() as u64,
        date: today_iso,
    }
}

fn approved_absences_on<'a>(
    requests: &'a [LeaveRequest],
    date_iso: &'a str,
) -> impl Iterator<Item = &'a LeaveRequest> + 'a {
    requests.iter().filter(move |r| {
        r.status == RequestStatus::Approved
            && r.request_type == RequestType::Absence
            && r.start_date.as_str() <= date_iso
            && r.end_date.as_str() >= date_iso
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AlertKind {
    AbsenceBalanceExceeded,
    LateHoursExceeded,
    FrequentLate,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub kind: AlertKind,
    pub teacher_id: String,
    pub teacher_name: String,
    pub value: f64,
    pub limit: f64,
    pub message: String,
}

/// 超出缺勤余额、超出迟到小时余额、本月迟到 ≥ 3 次
///
/// `requests` 需覆盖本年度，`month_records` 为本月考勤。
pub fn alerts(
    active_teachers: &[Teacher],
    requests: &[LeaveRequest],
    month_records: &[AttendanceRecord],
    today: NaiveDate,
) -> Vec<Alert> {
    let mut lates: HashMap<&str, u64> = HashMap::new();
    for r in month_records.iter().filter(|r| {
        r.status == AttendanceStatus::Late
            && r.year == i64::from(today.year())
            && r.month == i64::from(today.month())
    }) {
        *lates.entry(r.teacher_id.as_str()).or_default() += 1;
    }

    let mut out = Vec::new();
    for t in active_teachers {
        let b = balance(t, requests, today);
        if b.absence_days_used > t.absence_balance {
            out.push(Alert {
                kind: AlertKind::AbsenceBalanceExceeded,
                teacher_id: t.id.clone(),
                teacher_name: t.name.clone(),
                value: b.absence_days_used,
                limit: t.absence_balance,
                message: format!(
                    "{} used {} of {} absence days this year",
                    t.name, b.absence_days_used, t.absence_balance
                ),
            });
        }
        if b.late_hours_used > t.late_hours_balance {
            out.push(Alert {
                kind: AlertKind::LateHoursExceeded,
                teacher_id: t.id.clone(),
                teacher_name: t.name.clone(),
                value: b.late_hours_used,
                limit: t.late_hours_balance,
                message: format!(
                    "{} used {} of {} late hours this month",
                    t.name, b.late_hours_used, t.late_hours_balance
                ),
            });
        }
        let late_count = lates.get(t.id.as_str()).copied().unwrap_or(0);
        if late_count >= FREQUENT_LATE_THRESHOLD {
            out.push(Alert {
                kind: AlertKind::FrequentLate,
                teacher_id: t.id.clone(),
                teacher_name: t.name.clone(),
                value: late_count as f64,
                limit: FREQUENT_LATE_THRESHOLD as f64,
                message: format!("{} was late {late_count} times this month", t.name),
            });
        }
    }
    out
}

/// 当天一条考勤 + 教师信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherDay {
    pub teacher_id: String,
    pub name: String,
    pub subject: Option<String>,
    pub role: Role,
    pub status: Option<AttendanceStatus>,
    pub check_in: Option<String>,
    pub check_out: Option<String>,
    pub total_hours: f64,
}

impl TeacherDay {
    fn new(teacher: &Teacher, record: Option<&AttendanceRecord>) -> Self {
        Self {
            teacher_id: teacher.id.clone(),
            name: teacher.name.clone(),
            subject: teacher.subject.clone(),
            role: teacher.role,
            status: record.map(|r| r.status),
            check_in: record.and_then(|r| r.check_in.clone()),
            check_out: record.and_then(|r| r.check_out.clone()),
            total_hours: record.map(|r| r.total_hours).unwrap_or(0.0),
        }
    }
}

fn index_by_teacher(records: &[AttendanceRecord]) -> HashMap<&str, &AttendanceRecord> {
    records.iter().map(|r| (r.teacher_id.as_str(), r)).collect()
}

/// 每位在职教师及其当天状态（未打卡为 null）
pub fn team_status(active_teachers: &[Teacher], today_records: &[AttendanceRecord]) -> Vec<TeacherDay> {
    let by_teacher = index_by_teacher(today_records);
    active_teachers
        .iter()
        .map(|t| TeacherDay::new(t, by_teacher.get(t.id.as_str()).copied()))
        .collect()
}

/// 当天已签到，按签到时间排序
pub fn today_checkins(teachers: &[Teacher], today_records: &[AttendanceRecord]) -> Vec<TeacherDay> {
    let by_id: HashMap<&str, &Teacher> = teachers.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut out: Vec<TeacherDay> = today_records
        .iter()
        .filter(|r| r.check_in.is_some())
        .filter_map(|r| by_id.get(r.teacher_id.as_str()).map(|t| TeacherDay::new(t, Some(r))))
        .collect();
    out.sort_by(|a, b| a.check_in.cmp(&b.check_in));
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AbsenceSource {
    Attendance,
    Request,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayAbsence {
    pub teacher_id: String,
    pub name: String,
    pub subject: Option<String>,
    pub source: AbsenceSource,
    pub request_id: Option<String>,
    pub reason: Option<String>,
}

/// 当天记为 Absent 的记录，加上覆盖当天的已批准缺勤申请（每人一条）
pub fn today_absences(
    teachers: &[Teacher],
    today_records: &[AttendanceRecord],
    requests: &[LeaveRequest],
    today: NaiveDate,
) -> Vec<TodayAbsence> {
    let today_iso = format_date(today);
    let by_id: HashMap<&str, &Teacher> = teachers.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for r in today_records
        .iter()
        .filter(|r| r.status == AttendanceStatus::Absent)
    {
        if let Some(t) = by_id.get(r.teacher_id.as_str())
            && seen.insert(t.id.as_str())
        {
            out.push(TodayAbsence {
                teacher_id: t.id.clone(),
                name: t.name.clone(),
                subject: t.subject.clone(),
                source: AbsenceSource::Attendance,
                request_id: None,
                reason: r.notes.clone(),
            });
        }
    }
    for r in approved_absences_on(requests, &today_iso) {
        if let Some(t) = by_id.get(r.teacher_id.as_str())
            && seen.insert(t.id.as_str())
        {
            out.push(TodayAbsence {
                teacher_id: t.id.clone(),
                name: t.name.clone(),
                subject: t.subject.clone(),
                source: AbsenceSource::Request,
                request_id: Some(r.id.clone()),
                reason: r.reason.clone(),
            });
        }
    }
    out
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingTeacher {
    pub teacher_id: String,
    pub name: String,
    pub email: String,
    pub subject: Option<String>,
}

/// 工作日里今天没有任何记录的在职教师；非工作日返回空
pub fn missing_teachers(
    active_teachers: &[Teacher],
    today_records: &[AttendanceRecord],
    calendar: &WorkCalendar,
    today: NaiveDate,
) -> Vec<MissingTeacher> {
    if !calendar.is_working_day(today) {
        return Vec::new();
    }
    let recorded: HashSet<&str> = today_records.iter().map(|r| r.teacher_id.as_str()).collect();
    active_teachers
        .iter()
        .filter(|t| !recorded.contains(t.id.as_str()))
        .map(|t| MissingTeacher {
            teacher_id: t.id.clone(),
            name: t.name.clone(),
            email: t.email.clone(),
            subject: t.subject.clone(),
        })
        .collect()
}

/// 今天或明天开始的待审批申请
pub fn immediate_requests(pending: &[LeaveRequest], today: NaiveDate) -> Vec<LeaveRequest> {
    let today_iso = format_date(today);
    let tomorrow_iso = today
        .checked_add_days(Days::new(1))
        .map(format_date)
        .unwrap_or_else(|| today_iso.clone());

    let mut out: Vec<LeaveRequest> = pending
        .iter()
        .filter(|r| r.status == RequestStatus::Pending)
        .filter(|r| r.start_date == today_iso || r.start_date == tomorrow_iso)
        .cloned()
        .collect();
    out.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.created_at.cmp(&b.created_at)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{SystemSettings, TeacherStatus, WorkType};

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn teacher(id: &str) -> Teacher {
        Teacher {
            id: id.into(),
            name: id.to_uppercase(),
            email: format!("{id}@school.test"),
            phone: None,
            subject: Some("Math".into()),
            work_type: WorkType::FullTime,
            birthdate: None,
            employment_date: None,
            password_hash: String::new(),
            role: Role::Employee,
            role_level: 1,
            authorities: vec![],
            status: TeacherStatus::Active,
            absence_balance: 2.0,
            late_hours_balance: 6.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn rec(teacher: &str, date: &str, status: AttendanceStatus, check_in: Option<&str>) -> AttendanceRecord {
        let day = d(date);
        AttendanceRecord {
            id: format!("{teacher}-{date}"),
            teacher_id: teacher.into(),
            date_iso: date.into(),
            check_in: check_in.map(Into::into),
            check_out: None,
            total_hours: 0.0,
            status,
            month: i64::from(day.month()),
            year: i64::from(day.year()),
            notes: None,
            recorded_by: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn req(id: &str, teacher_id: &str, start: &str, end: &str, status: RequestStatus, duration: f64) -> LeaveRequest {
        LeaveRequest {
            id: id.into(),
            teacher_id: teacher_id.into(),
            teacher_name: teacher_id.to_uppercase(),
            request_type: RequestType::Absence,
            status,
            start_date: start.into(),
            end_date: end.into(),
            duration,
            reason: Some("family".into()),
            approved_by: None,
            approver_name: None,
            approved_at: None,
            rejected_by: None,
            rejection_reason: None,
            rejected_at: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_missing_teachers_only_on_working_days() {
        let cal = WorkCalendar::new(&SystemSettings::default(), &[]);
        let teachers = vec![teacher("t1"), teacher("t2")];
        let records = vec![rec("t1", "2025-03-12", AttendanceStatus::Present, Some("07:20"))];

        let missing = missing_teachers(&teachers, &records, &cal, d("2025-03-12"));
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].teacher_id, "t2");

        // 2025-03-14 是周五
        assert!(missing_teachers(&teachers, &[], &cal, d("2025-03-14")).is_empty());
    }

    #[test]
    fn test_immediate_requests() {
        let pending = vec![
            req("a", "t1", "2025-03-12", "2025-03-12", RequestStatus::Pending, 1.0),
            req("b", "t1", "2025-03-13", "2025-03-14", RequestStatus::Pending, 2.0),
            req("c", "t1", "2025-03-14", "2025-03-14", RequestStatus::Pending, 1.0),
            req("d", "t1", "2025-03-12", "2025-03-12", RequestStatus::Approved, 1.0),
        ];
        let ids: Vec<String> = immediate_requests(&pending, d("2025-03-12"))
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_today_absences_merges_sources() {
        let teachers = vec![teacher("t1"), teacher("t2"), teacher("t3")];
        let records = vec![rec("t1", "2025-03-12", AttendanceStatus::Absent, None)];
        let requests = vec![
            req("r1", "t1", "2025-03-11", "2025-03-12", RequestStatus::Approved, 2.0),
            req("r2", "t2", "2025-03-10", "2025-03-13", RequestStatus::Approved, 4.0),
            req("r3", "t3", "2025-03-12", "2025-03-12", RequestStatus::Pending, 1.0),
        ];
        let absences = today_absences(&teachers, &records, &requests, d("2025-03-12"));
        assert_eq!(absences.len(), 2);
        assert_eq!(absences[0].source, AbsenceSource::Attendance);
        assert_eq!(absences[1].request_id.as_deref(), Some("r2"));
    }

    #[test]
    fn test_alerts() {
        let teachers = vec![teacher("t1"), teacher("t2")];
        let requests = vec![req("r1", "t1", "2025-01-05", "2025-01-07", RequestStatus::Approved, 3.0)];
        let records = vec![
            rec("t2", "2025-03-02", AttendanceStatus::Late, Some("08:00")),
            rec("t2", "2025-03-03", AttendanceStatus::Late, Some("08:00")),
            rec("t2", "2025-03-04", AttendanceStatus::Late, Some("08:00")),
        ];
        let alerts = alerts(&teachers, &requests, &records, d("2025-03-12"));
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].kind, AlertKind::AbsenceBalanceExceeded);
        assert_eq!(alerts[0].teacher_id, "t1");
        assert_eq!(alerts[1].kind, AlertKind::FrequentLate);
        assert_eq!(alerts[1].value, 3.0);
    }

    #[test]
    fn test_overview_and_quick_stats() {
        let cal = WorkCalendar::new(&SystemSettings::default(), &[]);
        let mut inactive = teacher("t3");
        inactive.status = TeacherStatus::Inactive;
        let teachers = vec![teacher("t1"), teacher("t2"), inactive];
        let records = vec![
            rec("t1", "2025-03-12", AttendanceStatus::Present, Some("07:20")),
            rec("t2", "2025-03-12", AttendanceStatus::Late, Some("08:05")),
        ];
        let o = overview(&teachers, &records, 4, &cal, d("2025-03-12"));
        assert_eq!(o.active_teachers, 2);
        assert_eq!(o.checked_in, 2);
        assert_eq!(o.attendance_rate, 100.0);
        assert!(o.is_working_day);

        let active: Vec<Teacher> = teachers.into_iter().filter(Teacher::is_active).collect();
        let q = quick_stats(&active, &records[..1], &[], d("2025-03-12"));
        assert_eq!((q.checked_in, q.not_checked_in), (1, 1));
    }
}
