//! System Settings API Handlers

use axum::{Json, extract::State};
use shared::models::{ActionKind, SettingsUpdate, SystemSettings, TargetType};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::settings;
use crate::utils::time::parse_time;
use crate::utils::validation::validate_optional_time;
use crate::utils::{ApiResponse, AppError, AppResult, ok, ok_with_message};

/// 设置只有一行
const SETTINGS_TARGET_ID: &str = "system";

pub async fn get(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<SystemSettings>>> {
    Ok(ok(settings::get(&state.pool).await?))
}

fn validate(payload: &SettingsUpdate, current: &SystemSettings) -> AppResult<()> {
    if let Some(days) = &payload.weekend_days
        && let Some(bad) = days.iter().find(|d| **d > 6)
    {
        return Err(AppError::validation(format!(
            "weekendDays must be 0 (Sunday) to 6 (Saturday), got {bad}"
        ))
        .with_detail("field", "weekendDays"));
    }
    validate_optional_time(&payload.work_start_time, "workStartTime")?;
    validate_optional_time(&payload.work_end_time, "workEndTime")?;

    let start = parse_time(payload.work_start_time.as_deref().unwrap_or(&current.work_start_time))?;
    let end = parse_time(payload.work_end_time.as_deref().unwrap_or(&current.work_end_time))?;
    if end <= start {
        return Err(AppError::validation("workEndTime must be after workStartTime")
            .with_detail("field", "workEndTime"));
    }

    if payload.late_grace_minutes.is_some_and(|m| !(0..=240).contains(&m)) {
        return Err(AppError::validation("lateGraceMinutes must be between 0 and 240")
            .with_detail("field", "lateGraceMinutes"));
    }
    for (value, field) in [
        (payload.default_absence_balance, "defaultAbsenceBalance"),
        (payload.default_late_hours_balance, "defaultLateHoursBalance"),
    ] {
        if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(AppError::validation(format!("{field} must be a non-negative number"))
                .with_detail("field", field));
        }
    }
    Ok(())
}

pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<SettingsUpdate>,
) -> AppResult<Json<ApiResponse<SystemSettings>>> {
    let existing = settings::get(&state.pool).await?;
    validate(&payload, &existing)?;

    let updated = settings::update(&state.pool, &payload, &user.id).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::UpdateSettings,
            TargetType::Settings,
            SETTINGS_TARGET_ID,
            Some(&existing),
            Some(&updated),
        )
        .await;

    tracing::info!(by = %user.id, "System settings updated");
    Ok(ok_with_message("Settings updated", updated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_settings() {
        let current = SystemSettings::default();
        assert!(validate(&SettingsUpdate::default(), &current).is_ok());

        let bad_day = SettingsUpdate {
            weekend_days: Some(vec![5, 7]),
            ..Default::default()
        };
        assert!(validate(&bad_day, &current).is_err());

        let inverted = SettingsUpdate {
            work_end_time: Some("07:00".into()),
            ..Default::default()
        };
        assert!(validate(&inverted, &current).is_err());

        let negative = SettingsUpdate {
            default_late_hours_balance: Some(-1.0),
            ..Default::default()
        };
        assert!(validate(&negative, &current).is_err());

        let ok_update = SettingsUpdate {
            weekend_days: Some(vec![0, 6]),
            work_start_time: Some("08:00".into()),
            late_grace_minutes: Some(15),
            ..Default::default()
        };
        assert!(validate(&ok_update, &current).is_ok());
    }
}
