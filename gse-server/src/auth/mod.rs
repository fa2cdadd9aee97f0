//! 认证授权模块
//!
//! - [`JwtService`] - JWT 令牌服务
//! - [`legacy_token`] - 旧版 `gse_` 令牌解析
//! - [`CurrentUser`] - 当前用户上下文
//! - [`policy`] - 集中式权限策略 `can(user, action, target)`
//! - [`require_auth`] - 认证中间件
//! - [`require_role`] / [`require_capability`] - 角色 / 权限检查中间件

pub mod current_user;
pub mod extractor;
pub mod jwt;
pub mod legacy_token;
pub mod middleware;
pub mod password;
pub mod policy;

pub use current_user::CurrentUser;
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use middleware::{CurrentUserExt, require_admin, require_auth, require_capability, require_role};
pub use policy::{Action, Target, can};

use crate::utils::AppError;

/// 策略检查，不通过返回 403
pub fn ensure(user: &CurrentUser, action: Action, target: Target<'_>) -> Result<(), AppError> {
    if can(user, action, target) {
        return Ok(());
    }
    crate::security_log!(
        WARN,
        "permission_denied",
        user_id = %user.id,
        user_role = %user.role,
        action = ?action
    );
    Err(AppError::forbidden(format!("Permission denied: {:?}", action)))
}
