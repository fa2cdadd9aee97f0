//! 认证中间件
//!
//! 为令牌认证和角色 / 权限检查提供 Axum 中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use shared::models::{Capability, Role};

use crate::auth::legacy_token::{self, LegacyTokenError};
use crate::auth::{CurrentUser, JwtError, JwtService};
use crate::core::ServerState;
use crate::db::repository::teacher;
use crate::utils::{AppError, ErrorCode};

/// 公共 API 路由 (无需认证)
const PUBLIC_API_ROUTES: &[&str] = &["/api/auth/login", "/api/health"];

/// 认证中间件 - 要求用户登录
///
/// 从 `Authorization: Bearer <token>` 头提取令牌：
/// - `gse_<id>_<ts>` 旧版令牌 (配置允许时)
/// - 其他按 JWT 验证
///
/// 两条路径都会重新读取教师记录，验证成功后将 [`CurrentUser`] 注入请求扩展。
///
/// # 错误处理
///
/// | 错误 | HTTP 状态码 |
/// |------|------------|
/// | 无 Authorization 头 | 401 NotAuthenticated |
/// | 令牌格式错误 / 签名错误 | 401 TokenInvalid |
/// | 令牌过期 | 401 TokenExpired |
/// | 用户不存在 | 401 NotAuthenticated |
/// | 用户已停用 | 401 AccountDisabled |
pub async fn require_auth(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    if PUBLIC_API_ROUTES.contains(&path) {
        return Ok(next.run(req).await);
    }

    let auth_header = req
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = match auth_header {
        Some(header) => JwtService::extract_from_header(header)
            .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
        None => {
            security_log!(WARN, "auth_missing", uri = %req.uri());
            return Err(AppError::unauthorized());
        }
    };

    let teacher_id = resolve_teacher_id(&state, token).inspect_err(|e| {
        security_log!(WARN, "auth_failed", error = %e, uri = %req.uri());
    })?;

    let teacher = teacher::find_by_id(&state.pool, &teacher_id)
        .await?
        .ok_or_else(|| {
            security_log!(WARN, "auth_unknown_user", user_id = %teacher_id);
            AppError::unauthorized()
        })?;

    if !teacher.is_active() {
        security_log!(WARN, "auth_inactive_user", user_id = %teacher.id);
        return Err(AppError::new(ErrorCode::AccountDisabled));
    }

    req.extensions_mut().insert(CurrentUser::from(&teacher));
    Ok(next.run(req).await)
}

/// 令牌 → 教师 ID
fn resolve_teacher_id(state: &ServerState, token: &str) -> Result<String, AppError> {
    if legacy_token::is_legacy_token(token) {
        if !state.config.legacy_tokens_enabled {
            return Err(AppError::invalid_token("Legacy tokens are disabled"));
        }
        return legacy_token::parse_with_max_age(
            token,
            state.config.legacy_token_max_age_hours,
            shared::util::now_millis(),
        )
        .map(|t| t.teacher_id)
        .map_err(|e| match e {
            LegacyTokenError::Expired => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        });
    }

    state
        .jwt_service
        .validate_token(token)
        .map(|claims| claims.sub)
        .map_err(|e| match e {
            JwtError::ExpiredToken => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid token"),
        })
}

type MiddlewareFuture =
    std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>;

/// 角色检查中间件 - 要求最低角色
///
/// ```ignore
/// Router::new()
///     .route("/team-status", get(handler::team_status))
///     .layer(middleware::from_fn(require_role(Role::Manager)));
/// ```
pub fn require_role(min: Role) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req.current_user()?;

            if user.role < min {
                security_log!(
                    WARN,
                    "role_required",
                    user_id = %user.id,
                    user_role = %user.role,
                    required_role = %min
                );
                return Err(AppError::with_message(
                    ErrorCode::RoleRequired,
                    format!("Role {} or higher required", min),
                ));
            }

            Ok(next.run(req).await)
        })
    }
}

/// 权限检查中间件 - 要求特定权限
///
/// # 错误
///
/// 无权限返回 403 PermissionDenied
pub fn require_capability(cap: Capability) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let user = req.current_user()?;

            if !user.has_capability(cap) {
                security_log!(
                    WARN,
                    "permission_denied",
                    user_id = %user.id,
                    user_role = %user.role,
                    capability = ?cap
                );
                return Err(AppError::forbidden(format!("Permission denied: {:?}", cap)));
            }

            Ok(next.run(req).await)
        })
    }
}

/// 管理员中间件 - 要求 ADMIN 角色
pub async fn require_admin(req: Request, next: Next) -> Result<Response, AppError> {
    let user = req.current_user()?;
    if !user.is_admin() {
        security_log!(
            WARN,
            "admin_required",
            user_id = %user.id,
            user_role = %user.role
        );
        return Err(AppError::new(ErrorCode::AdminRequired));
    }

    Ok(next.run(req).await)
}

/// 从请求中提取 CurrentUser 的扩展方法
pub trait CurrentUserExt {
    /// 从请求扩展中获取 CurrentUser
    ///
    /// 未认证返回 401
    fn current_user(&self) -> Result<&CurrentUser, AppError>;
}

impl CurrentUserExt for Request {
    fn current_user(&self) -> Result<&CurrentUser, AppError> {
        self.extensions()
            .get::<CurrentUser>()
            .ok_or_else(AppError::unauthorized)
    }
}
