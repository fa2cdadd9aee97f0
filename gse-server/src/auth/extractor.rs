//! CurrentUser Extractor
//!
//! 处理函数直接声明 `user: CurrentUser` 参数即可获取当前用户。
//! 用户由 [`require_auth`](super::require_auth) 中间件注入。

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppError;

impl FromRequestParts<ServerState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                security_log!(WARN, "auth_missing", uri = %parts.uri);
                Err(AppError::unauthorized())
            }
        }
    }
}
