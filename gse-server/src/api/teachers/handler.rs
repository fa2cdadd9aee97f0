//! Teacher API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{
    ActionKind, Capability, Role, TargetType, Teacher, TeacherCreate, TeacherStatus,
    TeacherUpdate,
};

use crate::analytics::{self, teacher as teacher_stats};
use crate::api::query::PeriodQuery;
use crate::auth::{self, Action, CurrentUser, Target, password};
use crate::core::ServerState;
use crate::db::repository::{attendance, request, settings, teacher};
use crate::db::repository::request::RequestFilter;
use crate::db::repository::teacher::TeacherFilter;
use crate::utils::time::local_today;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_email, validate_optional_date,
    validate_optional_text, validate_password, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok, ok_with_message};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub status: Option<TeacherStatus>,
    pub role: Option<Role>,
    pub subject: Option<String>,
    pub search: Option<String>,
}

async fn load(state: &ServerState, id: &str) -> AppResult<Teacher> {
    teacher::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::TeacherNotFound, format!("Teacher {id} not found"))
    })
}

fn target(t: &Teacher) -> Target<'_> {
    Target::Teacher {
        id: &t.id,
        role: t.role,
        grants: None,
    }
}

/// 列表；员工只能看到自己
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Teacher>>>> {
    if !auth::can(&user, Action::ReadTeacher, Target::Global) {
        let me = load(&state, &user.id).await?;
        return Ok(ok(vec![me]));
    }

    let filter = TeacherFilter {
        status: query.status,
        role: query.role,
        subject: query.subject.filter(|s| !s.trim().is_empty()),
        search: query.search.filter(|s| !s.trim().is_empty()),
    };
    let teachers = teacher::find_all(&state.pool, &filter).await?;
    Ok(ok(teachers))
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Teacher>>> {
    let t = load(&state, &id).await?;
    auth::ensure(&user, Action::ReadTeacher, target(&t))?;
    Ok(ok(t))
}

fn validate_create(payload: &TeacherCreate) -> AppResult<()> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_email(&payload.email)?;
    validate_password(&payload.password)?;
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.subject, "subject", MAX_SHORT_TEXT_LEN)?;
    validate_optional_date(&payload.birthdate, "birthdate")?;
    validate_optional_date(&payload.employment_date, "employmentDate")?;
    validate_balances(payload.absence_balance, payload.late_hours_balance)
}

fn validate_balances(absence: Option<f64>, late_hours: Option<f64>) -> AppResult<()> {
    for (value, field) in [(absence, "absenceBalance"), (late_hours, "lateHoursBalance")] {
        if let Some(v) = value
            && (!v.is_finite() || v < 0.0)
        {
            return Err(AppError::validation(format!("{field} must be a non-negative number"))
                .with_detail("field", field));
        }
    }
    Ok(())
}

/// 经理不能创建 / 修改 ADMIN，也不能授予 ADMIN 角色
fn ensure_not_touching_admin(user: &CurrentUser, current: Role, grants: Option<Role>) -> AppResult<()> {
    if !user.is_admin() && (current == Role::Admin || grants == Some(Role::Admin)) {
        crate::security_log!(WARN, "modify_admin_denied", user_id = %user.id, user_role = %user.role);
        return Err(AppError::new(ErrorCode::CannotModifyAdmin));
    }
    Ok(())
}

/// 非管理员只能授予自己持有的权限
fn ensure_grantable(user: &CurrentUser, authorities: Option<&[Capability]>) -> AppResult<()> {
    if user.is_admin() {
        return Ok(());
    }
    if let Some(cap) = authorities
        .unwrap_or_default()
        .iter()
        .find(|c| !user.has_capability(**c))
    {
        crate::security_log!(WARN, "grant_authority_denied", user_id = %user.id, capability = ?cap);
        return Err(AppError::forbidden(format!(
            "Cannot grant an authority you do not hold: {cap:?}"
        )));
    }
    Ok(())
}

pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(mut payload): Json<TeacherCreate>,
) -> AppResult<Json<ApiResponse<Teacher>>> {
    let role = payload.role.unwrap_or_default();
    ensure_not_touching_admin(&user, role, payload.role)?;
    auth::ensure(
        &user,
        Action::CreateTeacher,
        Target::Teacher {
            id: "",
            role,
            grants: payload.role,
        },
    )?;
    ensure_grantable(&user, payload.authorities.as_deref())?;
    validate_create(&payload)?;

    // 未指定余额时使用系统默认值
    if payload.absence_balance.is_none() || payload.late_hours_balance.is_none() {
        let defaults = settings::get(&state.pool).await?;
        payload
            .absence_balance
            .get_or_insert(defaults.default_absence_balance);
        payload
            .late_hours_balance
            .get_or_insert(defaults.default_late_hours_balance);
    }

    let hash = password::hash_password(&payload.password)?;
    let created = teacher::create(&state.pool, &payload, &hash).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::CreateTeacher,
            TargetType::Teacher,
            &created.id,
            None,
            Some(&created),
        )
        .await;

    tracing::info!(teacher_id = %created.id, by = %user.id, "Teacher created");
    Ok(ok_with_message("Teacher created", created))
}

pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<TeacherUpdate>,
) -> AppResult<Json<ApiResponse<Teacher>>> {
    let existing = load(&state, &id).await?;
    let is_self = existing.id == user.id;

    // 非管理员修改自己的资料时只能改基础信息 (角色、权限、状态、余额除外)
    if is_self && !user.is_admin() && !payload.is_self_service() {
        crate::security_log!(WARN, "self_update_denied", user_id = %user.id, user_role = %user.role);
        return Err(AppError::forbidden("You may only update your own profile details"));
    }
    if !is_self {
        ensure_not_touching_admin(&user, existing.role, payload.role)?;
        ensure_grantable(&user, payload.authorities.as_deref())?;
    }
    auth::ensure(
        &user,
        Action::UpdateTeacher,
        Target::Teacher {
            id: &existing.id,
            role: existing.role,
            grants: payload.role,
        },
    )?;

    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    if let Some(email) = &payload.email {
        validate_email(email)?;
    }
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.subject, "subject", MAX_SHORT_TEXT_LEN)?;
    validate_optional_date(&payload.birthdate, "birthdate")?;
    validate_optional_date(&payload.employment_date, "employmentDate")?;
    validate_balances(payload.absence_balance, payload.late_hours_balance)?;

    let hash = match &payload.password {
        Some(pwd) => {
            validate_password(pwd)?;
            Some(password::hash_password(pwd)?)
        }
        None => None,
    };

    let updated = teacher::update(&state.pool, &id, &payload, hash.as_deref()).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::UpdateTeacher,
            TargetType::Teacher,
            &id,
            Some(&existing),
            Some(&updated),
        )
        .await;

    Ok(ok_with_message("Teacher updated", updated))
}

pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<bool>>> {
    if id == user.id {
        return Err(AppError::new(ErrorCode::TeacherCannotDeleteSelf));
    }
    let existing = load(&state, &id).await?;
    if existing.role == Role::Admin && !user.is_admin() {
        return Err(AppError::new(ErrorCode::CannotDeleteAdmin));
    }
    auth::ensure(&user, Action::DeleteTeacher, target(&existing))?;

    if !teacher::delete(&state.pool, &id).await? {
        return Err(AppError::with_message(
            ErrorCode::TeacherNotFound,
            format!("Teacher {id} not found"),
        ));
    }

    state
        .tracker
        .record::<Teacher>(
            &user,
            ActionKind::DeleteTeacher,
            TargetType::Teacher,
            &id,
            Some(&existing),
            None,
        )
        .await;

    tracing::info!(teacher_id = %id, by = %user.id, "Teacher deleted");
    Ok(ok_with_message("Teacher deleted", true))
}

fn own_requests(teacher_id: &str) -> RequestFilter {
    RequestFilter {
        teacher_id: Some(teacher_id.to_string()),
        ..Default::default()
    }
}

/// 周期考勤 + 余额
pub async fn summary(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> AppResult<Json<ApiResponse<teacher_stats::TeacherSummary>>> {
    let t = load(&state, &id).await?;
    auth::ensure(&user, Action::ReadTeacher, target(&t))?;

    let today = local_today();
    let range = query.resolve(today)?;
    let records =
        attendance::find_in_range(&state.pool, &range.start_iso(), &range.end_iso(), Some(&id))
            .await?;
    let requests = request::find_all(&state.pool, &own_requests(&id)).await?;
    let calendar = analytics::load_calendar(&state.pool).await?;
    let working_days = calendar.working_days(&range, today).len();

    Ok(ok(teacher_stats::summary(
        &t,
        &records,
        &requests,
        working_days,
        &range,
        today,
    )))
}

pub async fn balance(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<teacher_stats::Balance>>> {
    let t = load(&state, &id).await?;
    auth::ensure(&user, Action::ReadTeacher, target(&t))?;

    let requests = request::find_all(&state.pool, &own_requests(&id)).await?;
    Ok(ok(teacher_stats::balance(&t, &requests, local_today())))
}

/// 本人申请的决策；经理另加其他人的待审批申请
pub async fn notifications(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Vec<teacher_stats::Notification>>>> {
    let t = load(&state, &id).await?;
    auth::ensure(&user, Action::ReadTeacher, target(&t))?;

    let mut requests = request::find_all(&state.pool, &own_requests(&id)).await?;
    if t.role >= Role::Manager {
        requests.extend(
            request::find_pending(&state.pool)
                .await?
                .into_iter()
                .filter(|r| r.teacher_id != t.id),
        );
    }

    Ok(ok(teacher_stats::notifications(
        &t,
        &requests,
        shared::util::now_millis(),
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemainingHours {
    pub teacher_id: String,
    pub year: i32,
    pub month: u32,
    pub late_hours_balance: f64,
    pub late_hours_used: f64,
    pub late_hours_remaining: f64,
}

pub async fn remaining_hours(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<RemainingHours>>> {
    let t = load(&state, &id).await?;
    auth::ensure(&user, Action::ReadTeacher, target(&t))?;

    let requests = request::find_all(&state.pool, &own_requests(&id)).await?;
    let b = teacher_stats::balance(&t, &requests, local_today());
    Ok(ok(RemainingHours {
        teacher_id: b.teacher_id,
        year: b.year,
        month: b.month,
        late_hours_balance: b.late_hours_balance,
        late_hours_used: b.late_hours_used,
        late_hours_remaining: b.late_hours_remaining,
    }))
}
