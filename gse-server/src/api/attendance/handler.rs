//! Attendance API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Deserialize;
use shared::models::{
    ActionKind, AttendanceCreate, AttendanceRecord, AttendanceStatus, AttendanceUpdate,
    CheckPayload, SystemSettings, TargetType,
};

use crate::api::query::PeriodQuery;
use crate::auth::{self, Action, CurrentUser, Target};
use crate::core::ServerState;
use crate::db::repository::{RepoError, attendance, settings, teacher};
use crate::utils::time::{
    format_date, format_time, hours_between, local_now_time, local_today, parse_date, parse_time,
};
use crate::utils::validation::{MAX_NOTE_LEN, validate_optional_text, validate_optional_time};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok, ok_with_message};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub teacher_id: Option<String>,
    /// 单日，优先于 period
    pub date: Option<String>,
    pub period: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// 签到状态：晚于 `workStartTime + lateGraceMinutes` 记为迟到
fn check_in_status(now: NaiveTime, settings: &SystemSettings) -> AppResult<AttendanceStatus> {
    let start = parse_time(&settings.work_start_time)?;
    let deadline = start + chrono::Duration::minutes(settings.late_grace_minutes.max(0));
    Ok(if now > deadline {
        AttendanceStatus::Late
    } else {
        AttendanceStatus::Present
    })
}

/// 签退：写入时间和工时；早于 `workEndTime` 且原状态为 Present 时改为早退
fn apply_check_out(
    record: &mut AttendanceRecord,
    now: NaiveTime,
    settings: &SystemSettings,
) -> AppResult<()> {
    let check_in = record
        .check_in
        .as_deref()
        .ok_or_else(|| AppError::new(ErrorCode::NotCheckedIn))?;
    if record.check_out.is_some() {
        return Err(AppError::new(ErrorCode::AlreadyCheckedOut));
    }

    let end = parse_time(&settings.work_end_time)?;
    record.total_hours = hours_between(parse_time(check_in)?, now);
    record.check_out = Some(format_time(now));
    if now < end && record.status == AttendanceStatus::Present {
        record.status = AttendanceStatus::EarlyLeave;
    }
    Ok(())
}

/// 手工录入 / 更正时按签到签退时间计算工时
fn recompute_hours(record: &mut AttendanceRecord) -> AppResult<()> {
    record.total_hours = match (record.check_in.as_deref(), record.check_out.as_deref()) {
        (Some(i), Some(o)) => hours_between(parse_time(i)?, parse_time(o)?),
        _ => 0.0,
    };
    Ok(())
}

fn new_record(teacher_id: &str, date: NaiveDate, status: AttendanceStatus, by: &str) -> AttendanceRecord {
    let now = shared::util::now_millis();
    AttendanceRecord {
        id: shared::util::new_id(),
        teacher_id: teacher_id.to_string(),
        date_iso: format_date(date),
        check_in: None,
        check_out: None,
        total_hours: 0.0,
        status,
        month: i64::from(date.month()),
        year: i64::from(date.year()),
        notes: None,
        recorded_by: Some(by.to_string()),
        created_at: now,
        updated_at: now,
    }
}

/// 记录列表；员工只能看到自己的记录
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<AttendanceRecord>>>> {
    let teacher_id = match query.teacher_id.as_deref().filter(|s| !s.is_empty()) {
        Some(id) => {
            auth::ensure(&user, Action::ReadAttendance, Target::OwnedBy(id))?;
            Some(id.to_string())
        }
        None if auth::can(&user, Action::ReadAttendance, Target::Global) => None,
        None => Some(user.id.clone()),
    };

    let today = local_today();
    let (start, end) = match &query.date {
        Some(date) => {
            let day = format_date(parse_date(date)?);
            (day.clone(), day)
        }
        None => {
            let range = PeriodQuery {
                period: query.period.clone(),
                start_date: query.start_date.clone(),
                end_date: query.end_date.clone(),
            }
            .resolve(today)?;
            (range.start_iso(), range.end_iso())
        }
    };

    let records = attendance::find_in_range(&state.pool, &start, &end, teacher_id.as_deref()).await?;
    Ok(ok(records))
}

/// 当前用户今天的记录
pub async fn today(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Option<AttendanceRecord>>>> {
    let today = format_date(local_today());
    let record = attendance::find_by_teacher_date(&state.pool, &user.id, &today).await?;
    Ok(ok(record))
}

pub async fn check_in(
    State(state): State<ServerState>,
    user: CurrentUser,
    payload: Option<Json<CheckPayload>>,
) -> AppResult<Json<ApiResponse<AttendanceRecord>>> {
    auth::ensure(&user, Action::CheckInOut, Target::OwnedBy(&user.id))?;
    let notes = payload.and_then(|Json(p)| p.notes);
    validate_optional_text(&notes, "notes", MAX_NOTE_LEN)?;

    let settings = settings::get(&state.pool).await?;
    let today = local_today();
    let now = local_now_time();
    let status = check_in_status(now, &settings)?;

    let existing = attendance::find_by_teacher_date(&state.pool, &user.id, &format_date(today)).await?;
    let (before, saved) = match existing {
        Some(r) if r.check_in.is_some() => {
            return Err(AppError::new(ErrorCode::AlreadyCheckedIn).with_detail("date", r.date_iso));
        }
        // 经理预先录入 (例如 Absent) 后本人到校
        Some(r) => {
            let mut record = r.clone();
            record.check_in = Some(format_time(now));
            record.status = status;
            record.recorded_by = Some(user.id.clone());
            if notes.is_some() {
                record.notes = notes;
            }
            (Some(r), attendance::save(&state.pool, &record).await?)
        }
        None => {
            let mut record = new_record(&user.id, today, status, &user.id);
            record.check_in = Some(format_time(now));
            record.notes = notes;
            let saved = attendance::insert(&state.pool, &record)
                .await
                .map_err(|e| match e {
                    RepoError::Duplicate(_) => AppError::new(ErrorCode::AlreadyCheckedIn),
                    other => other.into(),
                })?;
            (None, saved)
        }
    };

    state
        .tracker
        .record(
            &user,
            ActionKind::CheckIn,
            TargetType::Attendance,
            &saved.id,
            before.as_ref(),
            Some(&saved),
        )
        .await;

    Ok(ok_with_message("Checked in", saved))
}

pub async fn check_out(
    State(state): State<ServerState>,
    user: CurrentUser,
    payload: Option<Json<CheckPayload>>,
) -> AppResult<Json<ApiResponse<AttendanceRecord>>> {
    auth::ensure(&user, Action::CheckInOut, Target::OwnedBy(&user.id))?;
    let notes = payload.and_then(|Json(p)| p.notes);
    validate_optional_text(&notes, "notes", MAX_NOTE_LEN)?;

    let settings = settings::get(&state.pool).await?;
    let today = format_date(local_today());
    let before = attendance::find_by_teacher_date(&state.pool, &user.id, &today)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::NotCheckedIn))?;

    let mut record = before.clone();
    apply_check_out(&mut record, local_now_time(), &settings)?;
    if notes.is_some() {
        record.notes = notes;
    }
    let saved = attendance::save(&state.pool, &record).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::CheckOut,
            TargetType::Attendance,
            &saved.id,
            Some(&before),
            Some(&saved),
        )
        .await;

    Ok(ok_with_message("Checked out", saved))
}

/// 手工录入 (例如 Absent)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<AttendanceCreate>,
) -> AppResult<Json<ApiResponse<AttendanceRecord>>> {
    auth::ensure(&user, Action::ManageAttendance, Target::OwnedBy(&payload.teacher_id))?;
    let date = parse_date(&payload.date_iso)?;
    validate_optional_time(&payload.check_in, "checkIn")?;
    validate_optional_time(&payload.check_out, "checkOut")?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    if teacher::find_by_id(&state.pool, &payload.teacher_id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::TeacherNotFound,
            format!("Teacher {} not found", payload.teacher_id),
        ));
    }

    let mut record = new_record(&payload.teacher_id, date, payload.status, &user.id);
    record.check_in = payload.check_in;
    record.check_out = payload.check_out;
    record.notes = payload.notes;
    recompute_hours(&mut record)?;

    let saved = attendance::insert(&state.pool, &record)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::AttendanceExists)
                .with_detail("teacherId", record.teacher_id.clone())
                .with_detail("date", record.date_iso.clone()),
            other => other.into(),
        })?;

    state
        .tracker
        .record(
            &user,
            ActionKind::CreateAttendance,
            TargetType::Attendance,
            &saved.id,
            None,
            Some(&saved),
        )
        .await;

    Ok(ok_with_message("Attendance recorded", saved))
}

/// 更正一条记录
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<AttendanceUpdate>,
) -> AppResult<Json<ApiResponse<AttendanceRecord>>> {
    let before = attendance::find_by_id(&state.pool, &id).await?.ok_or_else(|| {
        AppError::with_message(
            ErrorCode::AttendanceNotFound,
            format!("Attendance record {id} not found"),
        )
    })?;
    auth::ensure(&user, Action::ManageAttendance, Target::OwnedBy(&before.teacher_id))?;
    validate_optional_time(&payload.check_in, "checkIn")?;
    validate_optional_time(&payload.check_out, "checkOut")?;
    validate_optional_text(&payload.notes, "notes", MAX_NOTE_LEN)?;

    let mut record = before.clone();
    if let Some(check_in) = payload.check_in {
        record.check_in = Some(check_in);
    }
    if let Some(check_out) = payload.check_out {
        record.check_out = Some(check_out);
    }
    if let Some(status) = payload.status {
        record.status = status;
    }
    if let Some(notes) = payload.notes {
        record.notes = Some(notes);
    }
    record.recorded_by = Some(user.id.clone());
    recompute_hours(&mut record)?;

    let saved = attendance::save(&state.pool, &record).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::UpdateAttendance,
            TargetType::Attendance,
            &id,
            Some(&before),
            Some(&saved),
        )
        .await;

    Ok(ok_with_message("Attendance updated", saved))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn record(check_in: Option<&str>, status: AttendanceStatus) -> AttendanceRecord {
        AttendanceRecord {
            id: "a1".into(),
            teacher_id: "t1".into(),
            date_iso: "2025-03-12".into(),
            check_in: check_in.map(Into::into),
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

    #[test]
    fn test_check_in_grace_period() {
        let settings = SystemSettings::default();
        // 07:30 + 10 分钟
        assert_eq!(check_in_status(t("07:25"), &settings).unwrap(), AttendanceStatus::Present);
        assert_eq!(check_in_status(t("07:40"), &settings).unwrap(), AttendanceStatus::Present);
        assert_eq!(check_in_status(t("07:41"), &settings).unwrap(), AttendanceStatus::Late);
    }

    #[test]
    fn test_check_out_marks_early_leave() {
        let settings = SystemSettings::default();
        let mut r = record(Some("07:30"), AttendanceStatus::Present);
        apply_check_out(&mut r, t("13:00"), &settings).unwrap();
        assert_eq!(r.status, AttendanceStatus::EarlyLeave);
        assert_eq!(r.total_hours, 5.5);
        assert_eq!(r.check_out.as_deref(), Some("13:00"));

        // 迟到的记录保持 Late
        let mut late = record(Some("08:00"), AttendanceStatus::Late);
        apply_check_out(&mut late, t("13:00"), &settings).unwrap();
        assert_eq!(late.status, AttendanceStatus::Late);
    }

    #[test]
    fn test_check_out_errors() {
        let settings = SystemSettings::default();
        let mut none = record(None, AttendanceStatus::Absent);
        let err = apply_check_out(&mut none, t("14:30"), &settings).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotCheckedIn);

        let mut done = record(Some("07:30"), AttendanceStatus::Present);
        apply_check_out(&mut done, t("14:30"), &settings).unwrap();
        assert_eq!(done.status, AttendanceStatus::Present);
        let err = apply_check_out(&mut done, t("15:00"), &settings).unwrap_err();
        assert_eq!(err.code, ErrorCode::AlreadyCheckedOut);
    }
}
