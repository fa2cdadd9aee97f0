//! 单个教师的汇总：余额、周期考勤、通知

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use shared::models::{
    AttendanceRecord, LeaveRequest, RequestStatus, RequestType, Role, Teacher,
};

use super::attendance::{StatusCounts, total_hours};
use super::period::DateRange;
use super::{percent, round1};

/// 余额：缺勤按年计，迟到 / 早退按月计
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub teacher_id: String,
    pub year: i32,
    pub month: u32,
    pub absence_balance: f64,
    pub absence_days_used: f64,
    pub absence_days_remaining: f64,
    pub late_hours_balance: f64,
    pub late_hours_used: f64,
    pub late_hours_remaining: f64,
}

fn year_month(date_iso: &str) -> Option<(i32, u32)> {
    let year = date_iso.get(0..4)?.parse().ok()?;
    let month = date_iso.get(5..7)?.parse().ok()?;
    Some((year, month))
}

/// 只计入已批准的申请；`requests` 为该教师的申请
pub fn balance(teacher: &Teacher, requests: &[LeaveRequest], today: NaiveDate) -> Balance {
    let (year, month) = (today.year(), today.month());
    let mut absence_used = 0.0;
    let mut late_used = 0.0;

    for r in requests
        .iter()
        .filter(|r| r.teacher_id == teacher.id && r.status == RequestStatus::Approved)
    {
        let Some((y, m)) = year_month(&r.start_date) else {
            continue;
        };
        match r.request_type {
            RequestType::Absence if y == year => absence_used += r.duration,
            RequestType::Late | RequestType::EarlyLeave if y == year && m == month => {
                late_used += r.duration
            }
            _ => {}
        }
    }

    Balance {
        teacher_id: teacher.id.clone(),
        year,
        month,
        absence_balance: teacher.absence_balance,
        absence_days_used: round1(absence_used),
        absence_days_remaining: round1((teacher.absence_balance - absence_used).max(0.0)),
        late_hours_balance: teacher.late_hours_balance,
        late_hours_used: round1(late_used),
        late_hours_remaining: round1((teacher.late_hours_balance - late_used).max(0.0)),
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherSummary {
    pub teacher_id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub working_days: u64,
    #[serde(flatten)]
    pub counts: StatusCounts,
    pub total_hours: f64,
    /// round1(attended / workingDays × 100)
    pub attendance_rate: f64,
    pub pending_requests: u64,
    pub balance: Balance,
}

pub fn summary(
    teacher: &Teacher,
    records: &[AttendanceRecord],
    requests: &[LeaveRequest],
    working_days: usize,
    range: &DateRange,
    today: NaiveDate,
) -> TeacherSummary {
    let in_range: Vec<AttendanceRecord> = records
        .iter()
        .filter(|r| r.teacher_id == teacher.id && range.contains_iso(&r.date_iso))
        .cloned()
        .collect();
    let counts = StatusCounts::from_records(&in_range);

    TeacherSummary {
        teacher_id: teacher.id.clone(),
        name: teacher.name.clone(),
        start_date: range.start_iso(),
        end_date: range.end_iso(),
        working_days: working_days as u64,
        attendance_rate: percent(counts.attended(), working_days as u64),
        total_hours: total_hours(&in_range),
        counts,
        pending_requests: requests
            .iter()
            .filter(|r| r.teacher_id == teacher.id && r.status == RequestStatus::Pending)
            .count() as u64,
        balance: balance(teacher, requests, today),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    RequestApproved,
    RequestRejected,
    PendingApproval,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub request_id: String,
    pub teacher_id: String,
    pub teacher_name: String,
    #[serde(rename = "type")]
    pub request_type: RequestType,
    pub start_date: String,
    pub end_date: String,
    /// 决策时间或提交时间 (millis)
    pub at: i64,
    pub message: String,
}

pub const NOTIFICATION_WINDOW_MS: i64 = 30 * 24 * 60 * 60 * 1000;

fn request_label(t: RequestType) -> &'static str {
    match t {
        RequestType::Absence => "absence",
        RequestType::Late => "late arrival",
        RequestType::EarlyLeave => "early leave",
    }
}

/// 本人申请最近 30 天内的决策；经理及以上另加其他人的待审批申请
///
/// 最新的在前。
pub fn notifications(
    teacher: &Teacher,
    requests: &[LeaveRequest],
    now_millis: i64,
) -> Vec<Notification> {
    let since = now_millis - NOTIFICATION_WINDOW_MS;
    let mut items = Vec::new();

    for r in requests {
        let own = r.teacher_id == teacher.id;
        let entry = match r.status {
            RequestStatus::Approved if own => r.approved_at.filter(|t| *t >= since).map(|at| {
                let by = r.approver_name.as_deref().unwrap_or("a manager");
                (
                    NotificationKind::RequestApproved,
                    at,
                    format!("Your {} request for {} was approved by {by}", request_label(r.request_type), r.start_date),
                )
            }),
            RequestStatus::Rejected if own => r.rejected_at.filter(|t| *t >= since).map(|at| {
                let reason = r
                    .rejection_reason
                    .as_deref()
                    .map(|s| format!(": {s}"))
                    .unwrap_or_default();
                (
                    NotificationKind::RequestRejected,
                    at,
                    format!("Your {} request for {} was rejected{reason}", request_label(r.request_type), r.start_date),
                )
            }),
            RequestStatus::Pending if !own && teacher.role >= Role::Manager => Some((
                NotificationKind::PendingApproval,
                r.created_at,
                format!("{} submitted a {} request for {}", r.teacher_name, request_label(r.request_type), r.start_date),
            )),
            _ => None,
        };

        if let Some((kind, at, message)) = entry {
            items.push(Notification {
                kind,
                request_id: r.id.clone(),
                teacher_id: r.teacher_id.clone(),
                teacher_name: r.teacher_name.clone(),
                request_type: r.request_type,
                start_date: r.start_date.clone(),
                end_date: r.end_date.clone(),
                at,
                message,
            });
        }
    }

    items.sort_by(|a, b| b.at.cmp(&a.at));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{TeacherStatus, WorkType};

    fn teacher(id: &str, role: Role) -> Teacher {
        Teacher {
            id: id.into(),
            name: id.to_uppercase(),
            email: format!("{id}@school.test"),
            phone: None,
            subject: None,
            work_type: WorkType::FullTime,
            birthdate: None,
            employment_date: None,
            password_hash: String::new(),
            role,
            role_level: role.level(),
            authorities: vec![],
            status: TeacherStatus::Active,
            absence_balance: 10.0,
            late_hours_balance: 6.0,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn req(teacher_id: &str, start: &str, t: RequestType, status: RequestStatus, duration: f64) -> LeaveRequest {
        LeaveRequest {
            id: format!("{teacher_id}-{start}"),
            teacher_id: teacher_id.into(),
            teacher_name: teacher_id.to_uppercase(),
            request_type: t,
            status,
            start_date: start.into(),
            end_date: start.into(),
            duration,
            reason: None,
            approved_by: None,
            approver_name: Some("Boss".into()),
            approved_at: Some(1_000),
            rejected_by: None,
            rejection_reason: Some("busy week".into()),
            rejected_at: Some(2_000),
            created_at: 500,
            updated_at: 500,
        }
    }

    #[test]
    fn test_balance_counts_only_approved_in_window() {
        let t = teacher("t1", Role::Employee);
        let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let requests = vec![
            req("t1", "2025-01-10", RequestType::Absence, RequestStatus::Approved, 2.0),
            req("t1", "2024-12-10", RequestType::Absence, RequestStatus::Approved, 5.0),
            req("t1", "2025-03-02", RequestType::Late, RequestStatus::Approved, 1.5),
            req("t1", "2025-02-02", RequestType::Late, RequestStatus::Approved, 3.0),
            req("t1", "2025-03-05", RequestType::EarlyLeave, RequestStatus::Pending, 2.0),
            req("t2", "2025-03-05", RequestType::Absence, RequestStatus::Approved, 4.0),
        ];
        let b = balance(&t, &requests, today);
        assert_eq!(b.absence_days_used, 2.0);
        assert_eq!(b.absence_days_remaining, 8.0);
        assert_eq!(b.late_hours_used, 1.5);
        assert_eq!(b.late_hours_remaining, 4.5);
    }

    #[test]
    fn test_remaining_never_negative() {
        let t = teacher("t1", Role::Employee);
        let today = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        let requests = vec![req("t1", "2025-03-01", RequestType::Absence, RequestStatus::Approved, 12.0)];
        assert_eq!(balance(&t, &requests, today).absence_days_remaining, 0.0);
    }

    #[test]
    fn test_notifications() {
        let requests = vec![
            req("t1", "2025-03-02", RequestType::Absence, RequestStatus::Approved, 1.0),
            req("t1", "2025-03-03", RequestType::Late, RequestStatus::Rejected, 1.0),
            req("t2", "2025-03-04", RequestType::Absence, RequestStatus::Pending, 1.0),
        ];

        let employee = notifications(&teacher("t1", Role::Employee), &requests, 10_000);
        assert_eq!(employee.len(), 2);
        assert_eq!(employee[0].kind, NotificationKind::RequestRejected);
        assert!(employee[0].message.ends_with(": busy week"));

        let manager = notifications(&teacher("m1", Role::Manager), &requests, 10_000);
        assert_eq!(manager.len(), 1);
        assert_eq!(manager[0].kind, NotificationKind::PendingApproval);

        // 超过 30 天的决策不再提示
        let later = notifications(&teacher("t1", Role::Employee), &requests, NOTIFICATION_WINDOW_MS + 5_000);
        assert!(later.is_empty());
    }
}
