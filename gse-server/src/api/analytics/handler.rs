//! Analytics API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use shared::models::{AttendanceRecord, Teacher};

use crate::analytics::{
    DateRange, attendance as attendance_stats, demographics as demographics_stats,
    requests as request_stats,
};
use crate::api::query::PeriodQuery;
use crate::core::ServerState;
use crate::db::repository::request::RequestFilter;
use crate::db::repository::{attendance, request, teacher};
use crate::utils::time::local_today;
use crate::utils::{ApiResponse, AppResult, ok};

/// 区间内的考勤行 + 在职教师 + 工作日数
struct RangeData {
    today: NaiveDate,
    range: DateRange,
    active: Vec<Teacher>,
    records: Vec<AttendanceRecord>,
    working_days: usize,
}

async fn load_range(state: &ServerState, query: &PeriodQuery) -> AppResult<RangeData> {
    let today = local_today();
    let range = query.resolve(today)?;
    let active = teacher::find_active(&state.pool).await?;
    let records =
        attendance::find_in_range(&state.pool, &range.start_iso(), &range.end_iso(), None).await?;
    let calendar = crate::analytics::load_calendar(&state.pool).await?;
    let working_days = calendar.working_days(&range, today).len();

    Ok(RangeData {
        today,
        range,
        active,
        records,
        working_days,
    })
}

pub async fn attendance_summary(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<attendance_stats::AttendanceSummary>>> {
    let data = load_range(&state, &query).await?;
    Ok(ok(attendance_stats::summarize(
        &data.records,
        data.active.len(),
        data.working_days,
        &data.range,
    )))
}

pub async fn attendance_trend(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<Vec<attendance_stats::TrendPoint>>>> {
    let data = load_range(&state, &query).await?;
    Ok(ok(attendance_stats::trend(&data.records, &data.range, data.today)))
}

pub async fn attendance_weekday(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<Vec<attendance_stats::WeekdayBucket>>>> {
    let data = load_range(&state, &query).await?;
    Ok(ok(attendance_stats::weekday_breakdown(&data.records, &data.range)))
}

pub async fn department_summary(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<Vec<attendance_stats::DepartmentSummary>>>> {
    let data = load_range(&state, &query).await?;
    Ok(ok(attendance_stats::department_summary(
        &data.active,
        &data.records,
        data.working_days,
        &data.range,
    )))
}

pub async fn requests_summary(
    State(state): State<ServerState>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<request_stats::RequestSummary>>> {
    let range = query.resolve(local_today())?;
    let filter = RequestFilter {
        from: Some(range.start_iso()),
        to: Some(range.end_iso()),
        ..Default::default()
    };
    let requests = request::find_all(&state.pool, &filter).await?;
    Ok(ok(request_stats::summarize(&requests, &range)))
}

pub async fn demographics(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<demographics_stats::Demographics>>> {
    let teachers = teacher::find_active(&state.pool).await?;
    Ok(ok(demographics_stats::demographics(&teachers, local_today())))
}
