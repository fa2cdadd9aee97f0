//! 请假申请统计

use serde::Serialize;
use shared::models::{LeaveRequest, RequestStatus, RequestType};

use super::period::DateRange;
use super::{percent, round1};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByStatus {
    pub pending: u64,
    pub approved: u64,
    pub rejected: u64,
    pub revoked: u64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByType {
    pub absence: u64,
    pub late: u64,
    pub early_leave: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    pub start_date: String,
    pub end_date: String,
    pub total: u64,
    pub by_status: ByStatus,
    pub by_type: ByType,
    /// round1(approved / (approved + rejected) × 100)
    pub approval_rate: f64,
    /// 已批准缺勤天数
    pub approved_absence_days: f64,
    /// 已批准迟到 / 早退小时数
    pub approved_late_hours: f64,
}

/// 与区间重叠的申请
pub fn overlaps(request: &LeaveRequest, range: &DateRange) -> bool {
    let start = range.start_iso();
    let end = range.end_iso();
    request.end_date.as_str() >= start.as_str() && request.start_date.as_str() <= end.as_str()
}

pub fn summarize(requests: &[LeaveRequest], range: &DateRange) -> RequestSummary {
    let mut by_status = ByStatus::default();
    let mut by_type = ByType::default();
    let mut absence_days = 0.0;
    let mut late_hours = 0.0;
    let mut total = 0;

    for r in requests.iter().filter(|r| overlaps(r, range)) {
        total += 1;
        match r.status {
            RequestStatus::Pending => by_status.pending += 1,
            RequestStatus::Approved => by_status.approved += 1,
            RequestStatus::Rejected => by_status.rejected += 1,
            RequestStatus::Revoked => by_status.revoked += 1,
        }
        match r.request_type {
            RequestType::Absence => by_type.absence += 1,
            RequestType::Late => by_type.late += 1,
            RequestType::EarlyLeave => by_type.early_leave += 1,
        }
        if r.status == RequestStatus::Approved {
            if r.request_type.is_hourly() {
                late_hours += r.duration;
            } else {
                absence_days += r.duration;
            }
        }
    }

    RequestSummary {
        start_date: range.start_iso(),
        end_date: range.end_iso(),
        total,
        approval_rate: percent(by_status.approved, by_status.approved + by_status.rejected),
        by_status,
        by_type,
        approved_absence_days: round1(absence_days),
        approved_late_hours: round1(late_hours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::period::Period;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn req(
        start: &str,
        end: &str,
        request_type: RequestType,
        status: RequestStatus,
        duration: f64,
    ) -> LeaveRequest {
        LeaveRequest {
            id: format!("r-{start}-{duration}"),
            teacher_id: "t1".into(),
            teacher_name: "T1".into(),
            request_type,
            status,
            start_date: start.into(),
            end_date: end.into(),
            duration,
            reason: None,
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
    fn test_approval_rate_and_totals() {
        let range = DateRange::new(d("2025-03-01"), d("2025-03-31"), Period::ThisMonth);
        let requests = vec![
            req("2025-03-02", "2025-03-03", RequestType::Absence, RequestStatus::Approved, 2.0),
            req("2025-03-05", "2025-03-05", RequestType::Late, RequestStatus::Approved, 1.5),
            req("2025-03-06", "2025-03-06", RequestType::EarlyLeave, RequestStatus::Rejected, 1.0),
            req("2025-03-07", "2025-03-07", RequestType::Absence, RequestStatus::Pending, 1.0),
            // 跨月开始，仍与区间重叠
            req("2025-02-27", "2025-03-01", RequestType::Absence, RequestStatus::Rejected, 3.0),
            req("2025-04-01", "2025-04-01", RequestType::Absence, RequestStatus::Approved, 1.0),
        ];
        let s = summarize(&requests, &range);
        assert_eq!(s.total, 5);
        assert_eq!(s.by_status.approved, 2);
        assert_eq!(s.by_status.rejected, 2);
        assert_eq!(s.by_type.absence, 3);
        assert_eq!(s.approval_rate, 50.0);
        assert_eq!(s.approved_absence_days, 2.0);
        assert_eq!(s.approved_late_hours, 1.5);
    }

    #[test]
    fn test_no_decisions_means_zero_rate() {
        let range = DateRange::new(d("2025-03-01"), d("2025-03-31"), Period::ThisMonth);
        let requests = vec![req(
            "2025-03-02",
            "2025-03-02",
            RequestType::Absence,
            RequestStatus::Pending,
            1.0,
        )];
        assert_eq!(summarize(&requests, &range).approval_rate, 0.0);
    }
}
