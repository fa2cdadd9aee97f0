//! Holiday Repository (soft delete)

use super::{RepoError, RepoResult};
use shared::error::ErrorCode;
use shared::models::{Holiday, HolidayCreate, HolidayUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, name_ar, date, is_recurring, is_active, created_by, created_at, updated_at, deleted_at, deleted_by";

fn date_taken(date: &str) -> RepoError {
    RepoError::Business(
        ErrorCode::HolidayDateExists,
        format!("An active holiday already exists on {date}"),
    )
}

fn map_duplicate(err: sqlx::Error, date: &str) -> RepoError {
    match RepoError::from(err) {
        RepoError::Duplicate(_) => date_taken(date),
        other => other,
    }
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Holiday>> {
    let sql = format!("SELECT {COLUMNS} FROM holiday WHERE id = ?");
    let holiday = sqlx::query_as::<_, Holiday>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(holiday)
}

pub async fn find_all(pool: &SqlitePool, include_inactive: bool) -> RepoResult<Vec<Holiday>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM holiday WHERE (?1 = 1 OR is_active = 1) ORDER BY date"
    );
    let holidays = sqlx::query_as::<_, Holiday>(&sql)
        .bind(include_inactive)
        .fetch_all(pool)
        .await?;
    Ok(holidays)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Holiday>> {
    find_all(pool, false).await
}

async fn find_active_on(pool: &SqlitePool, date: &str) -> RepoResult<Option<Holiday>> {
    let sql = format!("SELECT {COLUMNS} FROM holiday WHERE date = ? AND is_active = 1 LIMIT 1");
    let holiday = sqlx::query_as::<_, Holiday>(&sql)
        .bind(date)
        .fetch_optional(pool)
        .await?;
    Ok(holiday)
}

pub async fn create(
    pool: &SqlitePool,
    data: &HolidayCreate,
    created_by: &str,
) -> RepoResult<Holiday> {
    if find_active_on(pool, &data.date).await?.is_some() {
        return Err(date_taken(&data.date));
    }

    let id = shared::util::new_id();
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO holiday (id, name, name_ar, date, is_recurring, is_active, created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?7)",
    )
    .bind(&id)
    .bind(data.name.trim())
    .bind(data.name_ar.as_deref())
    .bind(&data.date)
    .bind(data.is_recurring)
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| map_duplicate(e, &data.date))?;

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create holiday".into()))
}

pub async fn update(pool: &SqlitePool, id: &str, data: &HolidayUpdate) -> RepoResult<Holiday> {
    if let Some(ref date) = data.date
        && let Some(other) = find_active_on(pool, date).await?
        && other.id != id
    {
        return Err(date_taken(date));
    }

    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE holiday SET name = COALESCE(?1, name), name_ar = COALESCE(?2, name_ar), date = COALESCE(?3, date), is_recurring = COALESCE(?4, is_recurring), updated_at = ?5 WHERE id = ?6 AND is_active = 1",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(data.name_ar.as_deref())
    .bind(data.date.as_deref())
    .bind(data.is_recurring)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| map_duplicate(e, data.date.as_deref().unwrap_or_default()))?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::HolidayNotFound,
            format!("Holiday {id} not found"),
        ));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Holiday {id} not found")))
}

/// Soft delete: `is_active = 0` plus deletion metadata
pub async fn soft_delete(pool: &SqlitePool, id: &str, deleted_by: &str) -> RepoResult<Holiday> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE holiday SET is_active = 0, deleted_at = ?1, deleted_by = ?2, updated_at = ?1 WHERE id = ?3 AND is_active = 1",
    )
    .bind(now)
    .bind(deleted_by)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::HolidayNotFound,
            format!("Holiday {id} not found"),
        ));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Holiday {id} not found")))
}
