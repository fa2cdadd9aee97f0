//! Holiday API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{ActionKind, Holiday, HolidayCreate, HolidayUpdate, TargetType};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::holiday;
use crate::utils::time::{format_date, parse_date};
use crate::utils::validation::{
    MAX_NAME_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok, ok_with_message};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// 默认只返回有效节假日
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<Holiday>>>> {
    let holidays = holiday::find_all(&state.pool, query.include_inactive).await?;
    Ok(ok(holidays))
}

/// 日期规范化为 YYYY-MM-DD
fn normalize_date(raw: &str) -> AppResult<String> {
    let date = parse_date(raw).map_err(|e| e.with_detail("field", "date"))?;
    Ok(format_date(date))
}

pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(mut payload): Json<HolidayCreate>,
) -> AppResult<Json<ApiResponse<Holiday>>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.name_ar, "nameAr", MAX_NAME_LEN)?;
    payload.date = normalize_date(&payload.date)?;

    let created = holiday::create(&state.pool, &payload, &user.id).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::CreateHoliday,
            TargetType::Holiday,
            &created.id,
            None,
            Some(&created),
        )
        .await;

    tracing::info!(holiday_id = %created.id, date = %created.date, "Holiday created");
    Ok(ok_with_message("Holiday created", created))
}

async fn load(state: &ServerState, id: &str) -> AppResult<Holiday> {
    holiday::find_by_id(&state.pool, id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::HolidayNotFound, format!("Holiday {id} not found"))
    })
}

pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(mut payload): Json<HolidayUpdate>,
) -> AppResult<Json<ApiResponse<Holiday>>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.name_ar, "nameAr", MAX_NAME_LEN)?;
    if let Some(date) = payload.date.take() {
        payload.date = Some(normalize_date(&date)?);
    }

    let existing = load(&state, &id).await?;
    let updated = holiday::update(&state.pool, &id, &payload).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::UpdateHoliday,
            TargetType::Holiday,
            &id,
            Some(&existing),
            Some(&updated),
        )
        .await;

    Ok(ok_with_message("Holiday updated", updated))
}

/// 软删除：isActive=false + deletedAt / deletedBy
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Holiday>>> {
    let existing = load(&state, &id).await?;
    let deleted = holiday::soft_delete(&state.pool, &id, &user.id).await?;

    state
        .tracker
        .record(
            &user,
            ActionKind::DeleteHoliday,
            TargetType::Holiday,
            &id,
            Some(&existing),
            Some(&deleted),
        )
        .await;

    tracing::info!(holiday_id = %id, by = %user.id, "Holiday deleted");
    Ok(ok_with_message("Holiday deleted", deleted))
}
