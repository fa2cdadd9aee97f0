//! Dashboard API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use shared::models::{AttendanceRecord, LeaveRequest, RequestStatus};

use crate::analytics::dashboard::{
    self, Alert, MissingTeacher, Overview, QuickStats, TeacherDay, TodayAbsence,
};
use crate::analytics::{
    self, attendance as attendance_stats, requests as request_stats,
};
use crate::api::query::PeriodQuery;
use crate::core::ServerState;
use crate::db::repository::request::RequestFilter;
use crate::db::repository::teacher::TeacherFilter;
use crate::db::repository::{attendance, request, teacher};
use crate::utils::time::{format_date, local_today};
use crate::utils::{ApiResponse, AppResult, ok};

async fn today_records(state: &ServerState, today: NaiveDate) -> AppResult<Vec<AttendanceRecord>> {
    Ok(attendance::find_by_date(&state.pool, &format_date(today)).await?)
}

async fn approved_requests(state: &ServerState) -> AppResult<Vec<LeaveRequest>> {
    let filter = RequestFilter {
        status: Some(RequestStatus::Approved),
        ..Default::default()
    };
    Ok(request::find_all(&state.pool, &filter).await?)
}

pub async fn overview(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Overview>>> {
    let today = local_today();
    let teachers = teacher::find_all(&state.pool, &TeacherFilter::default()).await?;
    let records = today_records(&state, today).await?;
    let pending = request::find_pending(&state.pool).await?.len();
    let calendar = analytics::load_calendar(&state.pool).await?;

    Ok(ok(dashboard::overview(
        &teachers, &records, pending, &calendar, today,
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardAnalytics {
    pub attendance: attendance_stats::AttendanceSummary,
    pub trend: Vec<attendance_stats::TrendPoint>,
    pub weekday: Vec<attendance_stats::WeekdayBucket>,
    pub requests: request_stats::RequestSummary,
}

/// 仪表盘图表数据：区间考勤汇总 + 趋势 + 申请统计
pub async fn analytics(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<DashboardAnalytics>>> {
    let today = local_today();
    let range = query.resolve(today)?;
    let (start, end) = (range.start_iso(), range.end_iso());

    let active = teacher::find_active(&state.pool).await?;
    let records = attendance::find_in_range(&state.pool, &start, &end, None).await?;
    let requests = request::find_all(
        &state.pool,
        &RequestFilter {
            from: Some(start),
            to: Some(end),
            ..Default::default()
        },
    )
    .await?;
    let calendar = analytics::load_calendar(&state.pool).await?;
    let working_days = calendar.working_days(&range, today).len();

    Ok(ok(DashboardAnalytics {
        attendance: attendance_stats::summarize(&records, active.len(), working_days, &range),
        trend: attendance_stats::trend(&records, &range, today),
        weekday: attendance_stats::weekday_breakdown(&records, &range),
        requests: request_stats::summarize(&requests, &range),
    }))
}

pub async fn alerts(State(state): State<ServerState>) -> AppResult<Json<ApiResponse<Vec<Alert>>>> {
    let today = local_today();
    let month_start = today.with_day(1).unwrap_or(today);
    let active = teacher::find_active(&state.pool).await?;
    let requests = approved_requests(&state).await?;
    let month_records = attendance::find_in_range(
        &state.pool,
        &format_date(month_start),
        &format_date(today),
        None,
    )
    .await?;

    Ok(ok(dashboard::alerts(&active, &requests, &month_records, today)))
}

pub async fn quick_stats(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<QuickStats>>> {
    let today = local_today();
    let active = teacher::find_active(&state.pool).await?;
    let records = today_records(&state, today).await?;
    let requests = request::find_all(&state.pool, &RequestFilter::default()).await?;

    Ok(ok(dashboard::quick_stats(&active, &records, &requests, today)))
}

pub async fn today_checkins(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<TeacherDay>>>> {
    let today = local_today();
    let teachers = teacher::find_all(&state.pool, &TeacherFilter::default()).await?;
    let records = today_records(&state, today).await?;
    Ok(ok(dashboard::today_checkins(&teachers, &records)))
}

pub async fn today_absences(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<TodayAbsence>>>> {
    let today = local_today();
    let teachers = teacher::find_all(&state.pool, &TeacherFilter::default()).await?;
    let records = today_records(&state, today).await?;
    let requests = approved_requests(&state).await?;
    Ok(ok(dashboard::today_absences(
        &teachers, &records, &requests, today,
    )))
}

pub async fn missing_teachers(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<MissingTeacher>>>> {
    let today = local_today();
    let active = teacher::find_active(&state.pool).await?;
    let records = today_records(&state, today).await?;
    let calendar = analytics::load_calendar(&state.pool).await?;
    Ok(ok(dashboard::missing_teachers(
        &active, &records, &calendar, today,
    )))
}

pub async fn immediate_requests(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<LeaveRequest>>>> {
    let pending = request::find_pending(&state.pool).await?;
    Ok(ok(dashboard::immediate_requests(&pending, local_today())))
}
