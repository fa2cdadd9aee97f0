//! Data Tracking API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use shared::models::{
    ActionKind, DataChange, Paginated, TargetType, TrackingStatistics, page_window,
};

use crate::audit::backup::{self, BackupInfo};
use crate::audit::compaction::{self, CompactionReport};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::data_change::{self, ChangeFilter};
use crate::utils::{ApiResponse, AppResult, ok, ok_with_message};

pub async fn statistics(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<TrackingStatistics>>> {
    Ok(ok(state.tracker.statistics()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeQuery {
    pub target_type: Option<TargetType>,
    pub target_id: Option<String>,
    pub user_id: Option<String>,
    pub action: Option<ActionKind>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// 分页查询变更，最新在前
pub async fn changes(
    State(state): State<ServerState>,
    Query(query): Query<ChangeQuery>,
) -> AppResult<Json<ApiResponse<Paginated<DataChange>>>> {
    let (page, limit, offset) = page_window(query.page, query.limit);
    let filter = ChangeFilter {
        target_type: query.target_type,
        target_id: query.target_id.filter(|s| !s.is_empty()),
        user_id: query.user_id.filter(|s| !s.is_empty()),
        action: query.action,
    };
    let (items, total) = data_change::list(&state.pool, &filter, limit, offset).await?;

    Ok(ok(Paginated {
        items,
        total,
        page,
        limit,
    }))
}

/// 单个实体的完整变更历史 (仅未归档部分)
pub async fn history(
    State(state): State<ServerState>,
    Path((target_type, target_id)): Path<(TargetType, String)>,
) -> AppResult<Json<ApiResponse<Vec<DataChange>>>> {
    Ok(ok(
        data_change::history(&state.pool, target_type, &target_id).await?,
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct BackupPayload {
    pub label: Option<String>,
}

pub async fn create_backup(
    State(state): State<ServerState>,
    user: CurrentUser,
    payload: Option<Json<BackupPayload>>,
) -> AppResult<Json<ApiResponse<BackupInfo>>> {
    let label = payload
        .and_then(|Json(p)| p.label)
        .unwrap_or_else(|| "manual".to_string());
    let info = backup::create_backup(&state.pool, &state.config.backups_dir(), &label).await?;
    tracing::info!(file = %info.file_name, by = %user.id, "Manual backup created");
    Ok(ok_with_message("Backup created", info))
}

pub async fn list_backups(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Vec<BackupInfo>>>> {
    Ok(ok(backup::list_backups(&state.config.backups_dir()).await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct CompactQuery {
    #[serde(default)]
    pub force: bool,
}

pub async fn compact(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<CompactQuery>,
) -> AppResult<Json<ApiResponse<CompactionReport>>> {
    let report = compaction::compact(
        &state.pool,
        &state.tracker,
        &state.config.archive_dir(),
        query.force,
    )
    .await?;
    tracing::info!(archived = report.archived, by = %user.id, "Manual compaction finished");
    Ok(ok(report))
}
