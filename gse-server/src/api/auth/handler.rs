//! Authentication Handlers

use std::time::Duration;

use axum::{Json, extract::State};
use shared::models::{LoginRequest, LoginResponse, Teacher};

use crate::auth::CurrentUser;
use crate::auth::password::verify_password;
use crate::core::ServerState;
use crate::db::repository::teacher;
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode, ok};

/// 固定延迟，防止计时攻击
const AUTH_FIXED_DELAY_MS: u64 = 300;

/// 登录，返回 JWT
///
/// 用户不存在和密码错误返回同一个错误，防止枚举邮箱
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let email = req.email.trim().to_lowercase();
    let found = teacher::find_by_email(&state.pool, &email).await?;

    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    let user = match found {
        Some(t) if verify_password(&req.password, &t.password_hash) => t,
        Some(t) => {
            security_log!(WARN, "login_failed", email = %email, user_id = %t.id, reason = "invalid_password");
            return Err(AppError::invalid_credentials());
        }
        None => {
            security_log!(WARN, "login_failed", email = %email, reason = "user_not_found");
            return Err(AppError::invalid_credentials());
        }
    };

    if !user.is_active() {
        security_log!(WARN, "login_failed", email = %email, user_id = %user.id, reason = "account_disabled");
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    let token = state
        .jwt_service
        .generate_token(&user)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))?;

    security_log!(INFO, "login_success", user_id = %user.id, role = %user.role);

    Ok(ok(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt_service.expires_in_seconds(),
        user,
    }))
}

/// 当前用户的教师记录
pub async fn me(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ApiResponse<Teacher>>> {
    let teacher = teacher::find_by_id(&state.pool, &user.id)
        .await?
        .ok_or_else(AppError::unauthorized)?;
    Ok(ok(teacher))
}
