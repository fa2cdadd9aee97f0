//! 审计撤销
//!
//! 撤销一条审计记录并回滚关联实体的状态。审计记录与请求状态在同一个
//! SQLite 事务中写入。

use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{ActionKind, AuditActionRecord, RequestStatus, TargetType};
use sqlx::SqlitePool;

use super::DataTracker;
use crate::auth::CurrentUser;
use crate::db::repository::{RepoError, audit_action, request};

/// 撤销结果
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeOutcome {
    pub action: AuditActionRecord,
    /// 被恢复为 pending 的请求 id
    pub reverted_request_id: Option<String>,
}

fn db_err(e: sqlx::Error) -> AppError {
    RepoError::from(e).into()
}

/// 撤销审计操作（仅管理员，调用方负责权限检查）
///
/// - 不存在 → 404
/// - 已撤销 → 400
/// - 不可撤销 → 400
/// - `APPROVE_REQUEST` / `REJECT_REQUEST`：关联请求恢复为 pending，决策字段清空
pub async fn revoke(
    pool: &SqlitePool,
    tracker: &DataTracker,
    actor: &CurrentUser,
    action_id: &str,
    reason: Option<&str>,
) -> AppResult<RevokeOutcome> {
    let mut tx = pool.begin().await.map_err(db_err)?;

    let before = audit_action::find_by_id_tx(&mut tx, action_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::AuditActionNotFound,
                format!("Audit action {action_id} not found"),
            )
        })?;

    if before.is_revoked {
        return Err(AppError::new(ErrorCode::ActionAlreadyRevoked).with_detail("actionId", action_id));
    }
    if !before.can_be_revoked {
        return Err(AppError::new(ErrorCode::ActionNotRevocable)
            .with_detail("actionId", action_id)
            .with_detail("action", before.action.as_str()));
    }

    let decided = match before.action {
        ActionKind::ApproveRequest => Some(RequestStatus::Approved),
        ActionKind::RejectRequest => Some(RequestStatus::Rejected),
        _ => None,
    };
    let reverted_request_id = match decided {
        Some(from) if before.target_type == TargetType::Request => {
            if request::find_by_id_tx(&mut tx, &before.target_id).await?.is_none() {
                return Err(AppError::with_message(
                    ErrorCode::RequestNotFound,
                    format!("Request {} not found", before.target_id),
                ));
            }
            request::reset_to_pending(&mut tx, &before.target_id, from).await?;
            Some(before.target_id.clone())
        }
        _ => None,
    };

    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    audit_action::mark_revoked(&mut tx, action_id, &actor.id, reason, shared::util::now_millis())
        .await?;

    tx.commit().await.map_err(db_err)?;

    let after = audit_action::find_by_id(pool, action_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::AuditActionNotFound))?;

    tracing::info!(
        action_id = %action_id,
        revoked_by = %actor.id,
        request_id = ?reverted_request_id,
        "Audit action revoked"
    );

    tracker
        .record(
            actor,
            ActionKind::RevokeAction,
            TargetType::AuditAction,
            action_id,
            Some(&before),
            Some(&after),
        )
        .await;

    Ok(RevokeOutcome {
        action: after,
        reverted_request_id,
    })
}
