//! Teacher Repository

use super::{RepoError, RepoResult, to_json_text};
use shared::error::ErrorCode;
use shared::models::{Role, Teacher, TeacherCreate, TeacherStatus, TeacherUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, name, email, phone, subject, work_type, birthdate, employment_date, password_hash, role, role_level, authorities, status, absence_balance, late_hours_balance, created_at, updated_at";

/// List filters
#[derive(Debug, Clone, Default)]
pub struct TeacherFilter {
    pub status: Option<TeacherStatus>,
    pub role: Option<Role>,
    pub subject: Option<String>,
    /// Case-insensitive match on name or email
    pub search: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn email_taken(email: &str) -> RepoError {
    RepoError::Business(
        ErrorCode::EmailAlreadyExists,
        format!("Email '{email}' already exists"),
    )
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<Teacher>> {
    let sql = format!("SELECT {COLUMNS} FROM teacher WHERE id = ?");
    let teacher = sqlx::query_as::<_, Teacher>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(teacher)
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<Teacher>> {
    let sql = format!("SELECT {COLUMNS} FROM teacher WHERE email = ? COLLATE NOCASE LIMIT 1");
    let teacher = sqlx::query_as::<_, Teacher>(&sql)
        .bind(normalize_email(email))
        .fetch_optional(pool)
        .await?;
    Ok(teacher)
}

pub async fn find_all(pool: &SqlitePool, filter: &TeacherFilter) -> RepoResult<Vec<Teacher>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM teacher WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR role = ?2) AND (?3 IS NULL OR subject = ?3) AND (?4 IS NULL OR name LIKE '%' || ?4 || '%' OR email LIKE '%' || ?4 || '%') ORDER BY name COLLATE NOCASE"
    );
    let teachers = sqlx::query_as::<_, Teacher>(&sql)
        .bind(filter.status)
        .bind(filter.role)
        .bind(filter.subject.as_deref())
        .bind(filter.search.as_deref())
        .fetch_all(pool)
        .await?;
    Ok(teachers)
}

pub async fn find_active(pool: &SqlitePool) -> RepoResult<Vec<Teacher>> {
    find_all(
        pool,
        &TeacherFilter {
            status: Some(TeacherStatus::Active),
            ..Default::default()
        },
    )
    .await
}

pub async fn count(pool: &SqlitePool) -> RepoResult<i64> {
    let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teacher")
        .fetch_one(pool)
        .await?;
    Ok(n)
}

/// Create a teacher; `data.password` must already be validated, the hash is stored instead
pub async fn create(
    pool: &SqlitePool,
    data: &TeacherCreate,
    password_hash: &str,
) -> RepoResult<Teacher> {
    let email = normalize_email(&data.email);
    if find_by_email(pool, &email).await?.is_some() {
        return Err(email_taken(&email));
    }

    let id = shared::util::new_id();
    let now = shared::util::now_millis();
    let role = data.role.unwrap_or_default();
    let authorities = to_json_text(&data.authorities.clone().unwrap_or_default())?;

    let result = sqlx::query(
        "INSERT INTO teacher (id, name, email, phone, subject, work_type, birthdate, employment_date, password_hash, role, role_level, authorities, status, absence_balance, late_hours_balance, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, 'Active', ?13, ?14, ?15, ?15)",
    )
    .bind(&id)
    .bind(data.name.trim())
    .bind(&email)
    .bind(data.phone.as_deref())
    .bind(data.subject.as_deref())
    .bind(data.work_type.unwrap_or_default())
    .bind(data.birthdate.as_deref())
    .bind(data.employment_date.as_deref())
    .bind(password_hash)
    .bind(role)
    .bind(role.level())
    .bind(authorities)
    .bind(data.absence_balance.unwrap_or(10.0))
    .bind(data.late_hours_balance.unwrap_or(6.0))
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {}
        // 并发插入同一邮箱时由唯一索引兜底
        Err(e) => {
            return Err(match RepoError::from(e) {
                RepoError::Duplicate(_) => email_taken(&email),
                other => other,
            });
        }
    }

    find_by_id(pool, &id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create teacher".into()))
}

/// Partial update; `password_hash` replaces the stored hash when present
pub async fn update(
    pool: &SqlitePool,
    id: &str,
    data: &TeacherUpdate,
    password_hash: Option<&str>,
) -> RepoResult<Teacher> {
    let email = data.email.as_deref().map(normalize_email);
    if let Some(ref email) = email
        && let Some(other) = find_by_email(pool, email).await?
        && other.id != id
    {
        return Err(email_taken(email));
    }

    let authorities = match &data.authorities {
        Some(caps) => Some(to_json_text(caps)?),
        None => None,
    };
    let now = shared::util::now_millis();

    let result = sqlx::query(
        "UPDATE teacher SET name = COALESCE(?1, name), email = COALESCE(?2, email), phone = COALESCE(?3, phone), subject = COALESCE(?4, subject), work_type = COALESCE(?5, work_type), birthdate = COALESCE(?6, birthdate), employment_date = COALESCE(?7, employment_date), password_hash = COALESCE(?8, password_hash), role = COALESCE(?9, role), role_level = COALESCE(?10, role_level), authorities = COALESCE(?11, authorities), status = COALESCE(?12, status), absence_balance = COALESCE(?13, absence_balance), late_hours_balance = COALESCE(?14, late_hours_balance), updated_at = ?15 WHERE id = ?16",
    )
    .bind(data.name.as_deref().map(str::trim))
    .bind(email.as_deref())
    .bind(data.phone.as_deref())
    .bind(data.subject.as_deref())
    .bind(data.work_type)
    .bind(data.birthdate.as_deref())
    .bind(data.employment_date.as_deref())
    .bind(password_hash)
    .bind(data.role)
    .bind(data.role.map(Role::level))
    .bind(authorities)
    .bind(data.status)
    .bind(data.absence_balance)
    .bind(data.late_hours_balance)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .map_err(|e| match RepoError::from(e) {
        RepoError::Duplicate(_) => email_taken(email.as_deref().unwrap_or_default()),
        other => other,
    })?;

    if result.rows_affected() == 0 {
        return Err(RepoError::Business(
            ErrorCode::TeacherNotFound,
            format!("Teacher {id} not found"),
        ));
    }

    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Teacher {id} not found")))
}

/// Hard delete; history stays in the tracking log
pub async fn delete(pool: &SqlitePool, id: &str) -> RepoResult<bool> {
    let result = sqlx::query("DELETE FROM teacher WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Distinct subjects with teacher counts (active teachers only)
pub async fn subject_counts(pool: &SqlitePool) -> RepoResult<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        "SELECT subject, COUNT(*) FROM teacher WHERE subject IS NOT NULL AND TRIM(subject) != '' AND status = 'Active' GROUP BY subject ORDER BY subject COLLATE NOCASE",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Bootstrap path: insert an ADMIN directly
pub async fn create_admin(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
) -> RepoResult<Teacher> {
    let data = TeacherCreate {
        name: name.to_string(),
        email: email.to_string(),
        password: String::new(),
        phone: None,
        subject: None,
        work_type: None,
        birthdate: None,
        employment_date: None,
        role: Some(Role::Admin),
        authorities: Some(shared::models::Capability::ALL.to_vec()),
        absence_balance: None,
        late_hours_balance: None,
    };
    create(pool, &data, password_hash).await
}
