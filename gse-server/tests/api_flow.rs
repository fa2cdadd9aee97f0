//! End-to-end API flows over an in-memory database

use axum::Router;
use axum::body::Body;
use gse_server::core::build_router;
use gse_server::db::DbService;
use gse_server::{Config, ServerState};
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

const ADMIN_EMAIL: &str = "admin@gse.test";
const ADMIN_PASSWORD: &str = "admin-pass";

struct TestApp {
    router: Router,
    state: ServerState,
    _dir: TempDir,
}

async fn setup() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::for_tests(dir.path().to_string_lossy().to_string());
    config.admin_email = Some(ADMIN_EMAIL.into());
    config.admin_password = Some(ADMIN_PASSWORD.into());

    let db = DbService::in_memory().await.unwrap();
    let state = ServerState::from_pool(config, db.pool).await.unwrap();
    TestApp {
        router: build_router(state.clone()),
        state,
        _dir: dir,
    }
}

impl TestApp {
    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let resp = self.router.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["data"]["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    /// Creates a teacher through the API and returns its id
    async fn create_teacher(&self, token: &str, email: &str, role: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/api/teachers",
                Some(token),
                Some(json!({
                    "name": format!("Teacher {email}"),
                    "email": email,
                    "password": "secret-123",
                    "subject": "Math",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create teacher failed: {body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn test_health_is_public() {
    let app = setup().await;
    let (status, body) = app.call("GET", "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_login_and_me() {
    let app = setup().await;
    let token = app.admin_token().await;

    let (status, body) = app.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], ADMIN_EMAIL);
    assert_eq!(body["data"]["role"], "ADMIN");
    assert!(body["data"].get("passwordHash").is_none());

    let (status, body) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = setup().await;

    let (status, _) = app.call("GET", "/api/teachers", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.call("GET", "/api/teachers", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 旧版令牌格式错误
    let (status, _) = app.call("GET", "/api/teachers", Some("gse_broken"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app
        .call("GET", "/api/teachers", Some("gse_abc_notanumber"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_legacy_token_resolves_teacher() {
    let app = setup().await;
    let token = app.admin_token().await;
    let (_, me) = app.call("GET", "/api/auth/me", Some(&token), None).await;
    let admin_id = me["data"]["id"].as_str().unwrap();

    let legacy = format!("gse_{admin_id}_{}", shared::util::now_millis());
    let (status, body) = app.call("GET", "/api/auth/me", Some(&legacy), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], admin_id);
}

#[tokio::test]
async fn test_duplicate_email_rejected_without_insert() {
    let app = setup().await;
    let token = app.admin_token().await;
    app.create_teacher(&token, "amal@gse.test", "EMPLOYEE").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/teachers",
            Some(&token),
            Some(json!({
                "name": "Someone Else",
                "email": "AMAL@gse.test",
                "password": "secret-123",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, list) = app.call("GET", "/api/teachers", Some(&token), None).await;
    // admin + amal
    assert_eq!(list["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_inactive_teacher_cannot_login() {
    let app = setup().await;
    let token = app.admin_token().await;
    let id = app.create_teacher(&token, "sara@gse.test", "EMPLOYEE").await;
    let sara_token = app.login("sara@gse.test", "secret-123").await;

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/teachers/{id}"),
            Some(&token),
            Some(json!({ "status": "Inactive" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "sara@gse.test", "password": "secret-123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 已签发的令牌同样失效
    let (status, _) = app.call("GET", "/api/auth/me", Some(&sara_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_employee_sees_only_self() {
    let app = setup().await;
    let token = app.admin_token().await;
    let id = app.create_teacher(&token, "omar@gse.test", "EMPLOYEE").await;
    app.create_teacher(&token, "huda@gse.test", "EMPLOYEE").await;
    let omar = app.login("omar@gse.test", "secret-123").await;

    let (status, body) = app.call("GET", "/api/teachers", Some(&omar), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], id.as_str());

    let (status, _) = app
        .call("GET", "/api/dashboard/overview", Some(&omar), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_request_approve_and_revoke() {
    let app = setup().await;
    let admin = app.admin_token().await;
    app.create_teacher(&admin, "lina@gse.test", "EMPLOYEE").await;
    let lina = app.login("lina@gse.test", "secret-123").await;

    let (status, body) = app
        .call(
            "POST",
            "/api/requests",
            Some(&lina),
            Some(json!({
                "type": "absence",
                "startDate": "2024-03-10",
                "endDate": "2024-03-12",
                "reason": "Family matter",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["duration"], 3.0);
    assert_eq!(body["data"]["status"], "pending");
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    // 员工不能审批自己的申请
    let (status, _) = app
        .call("POST", &format!("/api/requests/{request_id}/approve"), Some(&lina), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call("POST", &format!("/api/requests/{request_id}/approve"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "approved");
    assert!(body["data"]["approvedBy"].is_string());

    // 已审批的申请不能再拒绝
    let (status, _) = app
        .call("POST", &format!("/api/requests/{request_id}/reject"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            "GET",
            &format!("/api/audit?action=APPROVE_REQUEST&targetId={request_id}"),
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    let action = &body["data"]["items"][0];
    assert_eq!(action["canBeRevoked"], true);
    let action_id = action["actionId"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            "POST",
            &format!("/api/audit/revoke/{action_id}"),
            Some(&admin),
            Some(json!({ "reason": "approved by mistake" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["action"]["isRevoked"], true);
    assert_eq!(body["data"]["revertedRequestId"], request_id.as_str());

    let (_, body) = app
        .call("GET", &format!("/api/requests/{request_id}"), Some(&admin), None)
        .await;
    assert_eq!(body["data"]["status"], "pending");
    assert!(body["data"]["approvedBy"].is_null());
    assert!(body["data"]["approvedAt"].is_null());

    // 重复撤销 → 400，不存在 → 404
    let (status, _) = app
        .call("POST", &format!("/api/audit/revoke/{action_id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = app
        .call("POST", "/api/audit/revoke/does-not-exist", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // 申请回到 pending 后可以再次审批
    let (status, body) = app
        .call(
            "POST",
            &format!("/api/requests/{request_id}/reject"),
            Some(&admin),
            Some(json!({ "reason": "No cover available" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["rejectionReason"], "No cover available");
}

#[tokio::test]
async fn test_manager_cannot_revoke() {
    let app = setup().await;
    let admin = app.admin_token().await;
    app.create_teacher(&admin, "mona@gse.test", "MANAGER").await;
    let mona = app.login("mona@gse.test", "secret-123").await;

    let (status, _) = app
        .call("POST", "/api/audit/revoke/anything", Some(&mona), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("GET", "/api/audit", Some(&mona), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_manager_cannot_escalate_own_or_others_authorities() {
    let app = setup().await;
    let admin = app.admin_token().await;
    let mona_id = app.create_teacher(&admin, "mona@gse.test", "MANAGER").await;
    let omar_id = app.create_teacher(&admin, "omar@gse.test", "EMPLOYEE").await;
    let mona = app.login("mona@gse.test", "secret-123").await;

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/teachers/{mona_id}"),
            Some(&mona),
            Some(json!({
                "authorities": ["manage_settings", "delete_teachers", "approve_requests"],
                "absenceBalance": 365,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/teachers/{mona_id}"),
            Some(&mona),
            Some(json!({ "status": "Inactive" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // 基础资料仍可修改
    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/teachers/{mona_id}"),
            Some(&mona),
            Some(json!({ "phone": "0550000000" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["phone"], "0550000000");
    assert_ne!(body["data"]["absenceBalance"], 365.0);

    // 不能授予他人自己没有的权限
    let (status, _) = app
        .call(
            "PUT",
            &format!("/api/teachers/{omar_id}"),
            Some(&mona),
            Some(json!({ "authorities": ["manage_settings"] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            "PUT",
            &format!("/api/teachers/{omar_id}"),
            Some(&mona),
            Some(json!({ "authorities": ["view_reports"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    // 权限未发生变化
    let (status, _) = app
        .call(
            "PUT",
            "/api/settings",
            Some(&mona),
            Some(json!({ "lateGraceMinutes": 99 })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app
        .call("DELETE", &format!("/api/teachers/{omar_id}"), Some(&mona), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_cancel_own_request() {
    let app = setup().await;
    let admin = app.admin_token().await;
    app.create_teacher(&admin, "nour@gse.test", "EMPLOYEE").await;
    let nour = app.login("nour@gse.test", "secret-123").await;

    let (_, body) = app
        .call(
            "POST",
            "/api/requests",
            Some(&nour),
            Some(json!({ "type": "late", "startDate": "2024-03-10", "duration": 1.5 })),
        )
        .await;
    let request_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call("POST", &format!("/api/requests/{request_id}/cancel"), Some(&nour), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "revoked");

    let (status, _) = app
        .call("POST", &format!("/api/requests/{request_id}/approve"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_end_before_start() {
    let app = setup().await;
    let admin = app.admin_token().await;
    let (status, _) = app
        .call(
            "POST",
            "/api/requests",
            Some(&admin),
            Some(json!({ "type": "absence", "startDate": "2024-03-12", "endDate": "2024-03-10" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_analytics_today_with_no_records() {
    let app = setup().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .call(
            "GET",
            "/api/analytics/attendance/summary?period=today",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    assert_eq!(data["period"], "today");
    assert_eq!(data["startDate"], data["endDate"]);
    assert_eq!(data["presentCount"], 0);
    assert_eq!(data["averageAttendance"], 0.0);

    let (status, body) = app
        .call("GET", "/api/analytics/requests/summary", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["approvalRate"], 0.0);

    let (status, _) = app
        .call(
            "GET",
            "/api/analytics/attendance/summary?startDate=2024-03-10&endDate=2024-03-01",
            Some(&admin),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_in_twice_conflicts() {
    let app = setup().await;
    let admin = app.admin_token().await;
    app.create_teacher(&admin, "rana@gse.test", "EMPLOYEE").await;
    let rana = app.login("rana@gse.test", "secret-123").await;

    let (status, _) = app
        .call("POST", "/api/attendance/check-out", Some(&rana), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("POST", "/api/attendance/check-in", Some(&rana), None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["checkIn"].is_string());

    let (status, _) = app
        .call("POST", "/api/attendance/check-in", Some(&rana), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .call("POST", "/api/attendance/check-out", Some(&rana), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["checkOut"].is_string());

    let (status, _) = app
        .call("POST", "/api/attendance/check-out", Some(&rana), None)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_holiday_soft_delete() {
    let app = setup().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .call(
            "POST",
            "/api/holidays",
            Some(&admin),
            Some(json!({ "name": "National Day", "date": "2024-12-18", "isRecurring": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .call(
            "POST",
            "/api/holidays",
            Some(&admin),
            Some(json!({ "name": "Duplicate", "date": "2024-12-18" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call("DELETE", &format!("/api/holidays/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);
    assert!(body["data"]["deletedAt"].is_number());

    let (_, body) = app.call("GET", "/api/holidays", Some(&admin), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());

    let (_, body) = app
        .call("GET", "/api/holidays?includeInactive=true", Some(&admin), None)
        .await;
    let all = body["data"].as_array().unwrap();
    assert_eq!(all.len(), 1);
    assert!(all[0]["deletedBy"].is_string());
}

#[tokio::test]
async fn test_settings_update_is_tracked() {
    let app = setup().await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .call(
            "PUT",
            "/api/settings",
            Some(&admin),
            Some(json!({ "lateGraceMinutes": 15 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["lateGraceMinutes"], 15);

    let (_, body) = app
        .call("GET", "/api/data-tracking/changes/settings/system", Some(&admin), None)
        .await;
    let history = body["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["action"], "UPDATE_SETTINGS");

    let stats = app.state.tracker.statistics();
    assert!(stats.total_changes >= 1);
    assert_eq!(stats.by_action.get("UPDATE_SETTINGS"), Some(&1));
}
