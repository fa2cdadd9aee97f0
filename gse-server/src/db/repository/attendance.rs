//! Attendance Repository

use super::{RepoError, RepoResult};
use shared::models::AttendanceRecord;
use sqlx::SqlitePool;

const COLUMNS: &str = "id, teacher_id, date_iso, check_in, check_out, total_hours, status, month, year, notes, recorded_by, created_at, updated_at";

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<AttendanceRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM attendance WHERE id = ?");
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

pub async fn find_by_teacher_date(
    pool: &SqlitePool,
    teacher_id: &str,
    date_iso: &str,
) -> RepoResult<Option<AttendanceRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM attendance WHERE teacher_id = ? AND date_iso = ?");
    let record = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(teacher_id)
        .bind(date_iso)
        .fetch_optional(pool)
        .await?;
    Ok(record)
}

/// Records with `start <= date_iso <= end` (string comparison on YYYY-MM-DD)
pub async fn find_in_range(
    pool: &SqlitePool,
    start: &str,
    end: &str,
    teacher_id: Option<&str>,
) -> RepoResult<Vec<AttendanceRecord>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM attendance WHERE date_iso >= ?1 AND date_iso <= ?2 AND (?3 IS NULL OR teacher_id = ?3) ORDER BY date_iso DESC, check_in"
    );
    let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .bind(start)
        .bind(end)
        .bind(teacher_id)
        .fetch_all(pool)
        .await?;
    Ok(records)
}

pub async fn find_by_date(pool: &SqlitePool, date_iso: &str) -> RepoResult<Vec<AttendanceRecord>> {
    find_in_range(pool, date_iso, date_iso, None).await
}

pub async fn find_all(pool: &SqlitePool) -> RepoResult<Vec<AttendanceRecord>> {
    let sql = format!("SELECT {COLUMNS} FROM attendance ORDER BY date_iso");
    let records = sqlx::query_as::<_, AttendanceRecord>(&sql)
        .fetch_all(pool)
        .await?;
    Ok(records)
}

/// Insert a new record; a second record for the same (teacher, date) is `Duplicate`
pub async fn insert(pool: &SqlitePool, record: &AttendanceRecord) -> RepoResult<AttendanceRecord> {
    sqlx::query(
        "INSERT INTO attendance (id, teacher_id, date_iso, check_in, check_out, total_hours, status, month, year, notes, recorded_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
    )
    .bind(&record.id)
    .bind(&record.teacher_id)
    .bind(&record.date_iso)
    .bind(record.check_in.as_deref())
    .bind(record.check_out.as_deref())
    .bind(record.total_hours)
    .bind(record.status)
    .bind(record.month)
    .bind(record.year)
    .bind(record.notes.as_deref())
    .bind(record.recorded_by.as_deref())
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    find_by_id(pool, &record.id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create attendance record".into()))
}

/// Persist the mutable columns of an existing record
pub async fn save(pool: &SqlitePool, record: &AttendanceRecord) -> RepoResult<AttendanceRecord> {
    let now = shared::util::now_millis();
    let result = sqlx::query(
        "UPDATE attendance SET check_in = ?1, check_out = ?2, total_hours = ?3, status = ?4, notes = ?5, recorded_by = ?6, updated_at = ?7 WHERE id = ?8",
    )
    .bind(record.check_in.as_deref())
    .bind(record.check_out.as_deref())
    .bind(record.total_hours)
    .bind(record.status)
    .bind(record.notes.as_deref())
    .bind(record.recorded_by.as_deref())
    .bind(now)
    .bind(&record.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!(
            "Attendance record {} not found",
            record.id
        )));
    }

    find_by_id(pool, &record.id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Attendance record {} not found", record.id)))
}
