//! System Settings Repository (single row, id = 1)

use super::{RepoResult, to_json_text};
use shared::models::{SettingsUpdate, SystemSettings};
use sqlx::SqlitePool;

const COLUMNS: &str = "weekend_days, work_start_time, work_end_time, late_grace_minutes, default_absence_balance, default_late_hours_balance, updated_at, updated_by";

/// Load settings; a missing row (fresh schema) yields defaults
pub async fn get(pool: &SqlitePool) -> RepoResult<SystemSettings> {
    let sql = format!("SELECT {COLUMNS} FROM system_settings WHERE id = 1");
    let settings = sqlx::query_as::<_, SystemSettings>(&sql)
        .fetch_optional(pool)
        .await?;
    Ok(settings.unwrap_or_default())
}

pub async fn update(
    pool: &SqlitePool,
    data: &SettingsUpdate,
    updated_by: &str,
) -> RepoResult<SystemSettings> {
    let weekend_days = match &data.weekend_days {
        Some(days) => {
            let mut days = days.clone();
            days.sort_unstable();
            days.dedup();
            Some(to_json_text(&days)?)
        }
        None => None,
    };
    let now = shared::util::now_millis();

    sqlx::query("INSERT OR IGNORE INTO system_settings (id) VALUES (1)")
        .execute(pool)
        .await?;

    sqlx::query(
        "UPDATE system_settings SET weekend_days = COALESCE(?1, weekend_days), work_start_time = COALESCE(?2, work_start_time), work_end_time = COALESCE(?3, work_end_time), late_grace_minutes = COALESCE(?4, late_grace_minutes), default_absence_balance = COALESCE(?5, default_absence_balance), default_late_hours_balance = COALESCE(?6, default_late_hours_balance), updated_at = ?7, updated_by = ?8 WHERE id = 1",
    )
    .bind(weekend_days)
    .bind(data.work_start_time.as_deref())
    .bind(data.work_end_time.as_deref())
    .bind(data.late_grace_minutes)
    .bind(data.default_absence_balance)
    .bind(data.default_late_hours_balance)
    .bind(now)
    .bind(updated_by)
    .execute(pool)
    .await?;

    get(pool).await
}
