//! 인증 API 라우트.
//!
//! # 엔드포인트
//!
//! - `POST /api/auth/login` - 로그인 (프로필 본문 + 토큰 헤더)
//! - `GET /api/auth/sendAuthMail/{userId}` - 비밀번호 변경 인증번호 발송
//! - `GET /api/auth/sendFindPasswordMail?email=` - 이메일로 인증번호 발송
//! - `GET /api/auth/checkAuthNum/{userId}?authNum=` - 인증번호 확인
//! - `PUT /api/auth/password` - 비밀번호 변경 (토큰 필요)
//! - `GET /api/auth/sendSignUpMail?email=` - 회원가입 인증번호 발송
//! - `GET /api/auth/checkSignUpNum?email=&authNum=` - 회원가입 인증번호 확인

use axum::{
    extract::{Path, Query, State},
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use isnt_core::{AuthError, PublicProfile};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::auth::Authenticated;
use crate::error::ApiResult;
use crate::services::DeveloperLookup;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

/// 로그인 요청
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(rename = "userId", alias = "username")]
    pub user_id: String,
    pub password: String,
}

/// 비밀번호 변경 요청
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest {
    pub user_id: String,
    pub password: String,
    pub auth_num: u32,
}

/// 인증번호 쿼리
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthNumQuery {
    pub auth_num: u32,
}

/// 이메일 쿼리
#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    #[serde(default)]
    pub email: String,
}

/// 이메일 + 인증번호 쿼리
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpCheckQuery {
    #[serde(default)]
    pub email: String,
    pub auth_num: u32,
}

/// 인증번호 확인 응답
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CheckAuthNumResponse {
    pub success_yn: bool,
}

// ================================================================================================
// Handlers
// ================================================================================================

/// 로그인.
///
/// 성공 시 공개 프로필을 본문으로, Access Token을 설정된 토큰 헤더로 반환합니다.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let outcome = state.auth.login(&request.user_id, &request.password).await?;

    let value = HeaderValue::from_str(&format!("Bearer {}", outcome.token.token))
        .map_err(|e| AuthError::Internal(e.to_string()))?;

    Ok((
        [(state.token_header.clone(), value)],
        Json::<PublicProfile>(outcome.profile),
    ))
}

/// userId로 인증번호 메일 발송.
pub async fn send_auth_mail(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    state
        .verification
        .request_code(DeveloperLookup::UserId(&user_id))
        .await?;
    Ok(StatusCode::OK)
}

/// 이메일로 비밀번호 찾기 인증번호 발송.
pub async fn send_find_password_mail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<StatusCode> {
    if query.email.trim().is_empty() {
        return Err(AuthError::ExternalIdentityOnly.into());
    }

    state
        .verification
        .request_code(DeveloperLookup::Email(query.email.trim()))
        .await?;
    Ok(StatusCode::OK)
}

/// 인증번호 확인 (소비하지 않음).
pub async fn check_auth_num(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    Query(query): Query<AuthNumQuery>,
) -> ApiResult<Json<CheckAuthNumResponse>> {
    let success_yn = state
        .verification
        .check_code(&user_id, query.auth_num)
        .await?;

    debug!(user_id = %user_id, success_yn, "Auth number checked");
    Ok(Json(CheckAuthNumResponse { success_yn }))
}

/// 비밀번호 변경.
///
/// 토큰 subject와 본문 userId가 다르면 인증번호와 관계없이 403입니다.
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    auth: Authenticated,
    Json(request): Json<UpdatePasswordRequest>,
) -> ApiResult<StatusCode> {
    auth.ensure_subject(&request.user_id)?;

    state
        .auth
        .update_password(&request.user_id, &request.password, request.auth_num)
        .await?;
    Ok(StatusCode::OK)
}

/// 회원가입 인증번호 발송.
pub async fn send_sign_up_mail(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<StatusCode> {
    state.verification.request_sign_up_code(&query.email).await?;
    Ok(StatusCode::OK)
}

/// 회원가입 인증번호 확인.
pub async fn check_sign_up_num(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignUpCheckQuery>,
) -> ApiResult<Json<CheckAuthNumResponse>> {
    let success_yn = state
        .verification
        .check_sign_up_code(&query.email, query.auth_num)
        .await?;
    Ok(Json(CheckAuthNumResponse { success_yn }))
}

// ================================================================================================
// Router
// ================================================================================================

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login))
        .route("/sendAuthMail/{user_id}", get(send_auth_mail))
        .route("/sendFindPasswordMail", get(send_find_password_mail))
        .route("/checkAuthNum/{user_id}", get(check_auth_num))
        .route("/password", put(update_password))
        .route("/sendSignUpMail", get(send_sign_up_mail))
        .route("/checkSignUpNum", get(check_sign_up_num))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiErrorResponse;
    use crate::repository::{CredentialStore, InMemoryCredentialStore};
    use crate::routes::create_router;
    use crate::state::create_test_state_with;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use chrono::Utc;
    use isnt_core::{NewDeveloper, VerificationCode};
    use isnt_notification::RecordingMailer;
    use tower::ServiceExt;

    struct TestApp {
        app: Router,
        state: Arc<AppState>,
        store: Arc<InMemoryCredentialStore>,
        mailer: Arc<RecordingMailer>,
    }

    async fn test_app() -> TestApp {
        let store = Arc::new(InMemoryCredentialStore::new());
        let mailer = Arc::new(RecordingMailer::new());
        let state = Arc::new(create_test_state_with(store.clone(), mailer.clone()));

        store
            .create(NewDeveloper {
                user_id: Some("tjddud".to_string()),
                email: "tjddud@naver.com".to_string(),
                password_hash: state.auth.hash_password("aa12345^").await.unwrap(),
                name: "tester".to_string(),
                introduction: Some("안녕하세요".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        store
            .create(NewDeveloper {
                user_id: Some("github-user".to_string()),
                name: "github".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        TestApp {
            app: create_router(state.clone()),
            state,
            store,
            mailer,
        }
    }

    async fn set_code(store: &InMemoryCredentialStore, value: u32) {
        let developer = store.find_by_user_id("tjddud").await.unwrap().unwrap();
        store
            .set_code(developer.id, &VerificationCode::new(value, Utc::now()))
            .await
            .unwrap();
    }

    fn login_request(authorization: Option<&str>) -> Request<Body> {
        let mut request = json_request(
            Method::POST,
            "/api/auth/login",
            serde_json::json!({ "userId": "tjddud", "password": "aa12345^" }),
        );
        if let Some(value) = authorization {
            request
                .headers_mut()
                .insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        }
        request
    }

    fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn password_request(token: &str, user_id: &str, auth_num: u32) -> Request<Body> {
        let mut request = json_request(
            Method::PUT,
            "/api/auth/password",
            serde_json::json!({ "userId": user_id, "password": "2", "authNum": auth_num }),
        );
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        request
    }

    #[tokio::test]
    async fn test_login_success_returns_profile_and_token() {
        let t = test_app().await;

        let response = t
            .app
            .oneshot(json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({ "userId": "tjddud", "password": "aa12345^" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let token = response
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .unwrap()
            .to_string();
        assert_eq!(t.state.tokens.validate(&token).unwrap(), "tjddud");

        let profile: serde_json::Value = body_json(response).await;
        assert_eq!(profile["userId"], "tjddud");
        assert_eq!(profile["email"], "tjddud@naver.com");
        assert_eq!(profile["introduction"], "안녕하세요");
        assert!(profile.get("passwordHash").is_none());
    }

    #[tokio::test]
    async fn test_login_accepts_username_alias() {
        let t = test_app().await;

        let response = t
            .app
            .oneshot(json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({ "username": "tjddud", "password": "aa12345^" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_wrong_password_is_unauthorized() {
        let t = test_app().await;

        let response = t
            .app
            .oneshot(json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({ "userId": "tjddud", "password": "aa12345^^" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(header::AUTHORIZATION).is_none());

        let error: ApiErrorResponse = body_json(response).await;
        assert_eq!(error.code, "AUTHENTICATION_FAILED");
    }

    #[tokio::test]
    async fn test_login_unknown_user_is_not_found() {
        let t = test_app().await;

        let response = t
            .app
            .oneshot(json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({ "userId": "nobody", "password": "x" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_send_auth_mail() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(get("/api/auth/sendAuthMail/tjddud"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(t.mailer.last().unwrap().to, "tjddud@naver.com");

        let response = t
            .app
            .clone()
            .oneshot(get("/api/auth/sendAuthMail/nobody"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = t
            .app
            .oneshot(get("/api/auth/sendAuthMail/github-user"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_send_auth_mail_failure_is_bad_gateway() {
        let t = test_app().await;
        t.mailer.fail_next_sends(true);

        let response = t
            .app
            .oneshot(get("/api/auth/sendAuthMail/tjddud"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_send_find_password_mail_by_email() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(get("/api/auth/sendFindPasswordMail?email=tjddud@naver.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(t.mailer.sent().len(), 1);

        let response = t
            .app
            .oneshot(get("/api/auth/sendFindPasswordMail?email=none@naver.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_check_auth_num() {
        let t = test_app().await;
        set_code(&t.store, 315572).await;

        let response = t
            .app
            .clone()
            .oneshot(get("/api/auth/checkAuthNum/tjddud?authNum=315572"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: CheckAuthNumResponse = body_json(response).await;
        assert!(body.success_yn);

        let response = t
            .app
            .oneshot(get("/api/auth/checkAuthNum/tjddud?authNum=999999"))
            .await
            .unwrap();
        let body: serde_json::Value = body_json(response).await;
        assert_eq!(body, serde_json::json!({ "successYn": false }));
    }

    #[tokio::test]
    async fn test_update_password_requires_token() {
        let t = test_app().await;
        set_code(&t.store, 315572).await;

        let response = t
            .app
            .oneshot(json_request(
                Method::PUT,
                "/api/auth/password",
                serde_json::json!({ "userId": "tjddud", "password": "2", "authNum": 315572 }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error: ApiErrorResponse = body_json(response).await;
        assert_eq!(error.code, "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_update_password_success() {
        let t = test_app().await;
        set_code(&t.store, 315572).await;
        let token = t.state.tokens.issue("tjddud").unwrap().token;

        let response = t
            .app
            .clone()
            .oneshot(password_request(&token, "tjddud", 315572))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = t
            .app
            .oneshot(json_request(
                Method::POST,
                "/api/auth/login",
                serde_json::json!({ "userId": "tjddud", "password": "2" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_update_password_subject_mismatch_is_forbidden() {
        let t = test_app().await;
        set_code(&t.store, 315572).await;
        let token = t.state.tokens.issue("someone-else").unwrap().token;

        let response = t
            .app
            .oneshot(password_request(&token, "tjddud", 315572))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let error: ApiErrorResponse = body_json(response).await;
        assert_eq!(error.code, "AUTHORIZATION_MISMATCH");
    }

    #[tokio::test]
    async fn test_update_password_wrong_code_is_bad_request() {
        let t = test_app().await;
        set_code(&t.store, 315572).await;
        let token = t.state.tokens.issue("tjddud").unwrap().token;

        let response = t
            .app
            .oneshot(password_request(&token, "tjddud", 999999))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_before_handler() {
        let t = test_app().await;

        // 공개 경로라도 잘못된 토큰은 거부
        let mut request = get("/api/auth/sendAuthMail/tjddud");
        request.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer invalid.token.value"),
        );

        let response = t.app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(t.mailer.sent().is_empty());

        let error: ApiErrorResponse = body_json(response).await;
        assert_eq!(error.code, "INVALID_TOKEN");
        assert_eq!(error.path.as_deref(), Some("/api/auth/sendAuthMail/tjddud"));
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let t = test_app().await;
        set_code(&t.store, 315572).await;

        let issued_at = Utc::now() - t.state.tokens.ttl() - chrono::Duration::seconds(5);
        let token = t.state.tokens.issue_at("tjddud", issued_at).unwrap().token;

        let response = t
            .app
            .oneshot(password_request(&token, "tjddud", 315572))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error: ApiErrorResponse = body_json(response).await;
        assert_eq!(error.code, "TOKEN_EXPIRED");
    }

    #[tokio::test]
    async fn test_sign_up_mail_flow() {
        let t = test_app().await;

        let response = t
            .app
            .clone()
            .oneshot(get("/api/auth/sendSignUpMail?email=new@naver.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let code = t
            .store
            .find_sign_up_code("new@naver.com")
            .await
            .unwrap()
            .unwrap()
            .value;

        let response = t
            .app
            .clone()
            .oneshot(get(&format!(
                "/api/auth/checkSignUpNum?email=new@naver.com&authNum={}",
                code
            )))
            .await
            .unwrap();
        let body: CheckAuthNumResponse = body_json(response).await;
        assert!(body.success_yn);

        let response = t
            .app
            .oneshot(get("/api/auth/sendSignUpMail?email="))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_login_ignores_stale_token_header() {
        let t = test_app().await;

        let issued_at = Utc::now() - t.state.tokens.ttl() - chrono::Duration::seconds(5);
        let expired = t.state.tokens.issue_at("tjddud", issued_at).unwrap().token;

        for stale in [format!("Bearer {}", expired), "Bearer invalid.token.value".to_string()] {
            let response = t
                .app
                .clone()
                .oneshot(login_request(Some(&stale)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            // 새 토큰 발급
            let issued = response
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .unwrap();
            assert_eq!(t.state.tokens.validate(issued).unwrap(), "tjddud");
        }
    }

    #[tokio::test]
    async fn test_send_find_password_mail_empty_email_is_conflict() {
        let t = test_app().await;

        for uri in [
            "/api/auth/sendFindPasswordMail?email=",
            "/api/auth/sendFindPasswordMail?email=%20%20",
            "/api/auth/sendFindPasswordMail",
        ] {
            let response = t.app.clone().oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::CONFLICT, "{}", uri);

            let error: ApiErrorResponse = body_json(response).await;
            assert_eq!(error.code, "EXTERNAL_IDENTITY_ONLY");
        }

        // 이메일이 빈 외부 인증 계정에는 인증번호가 발급되지 않음
        let github = t.store.find_by_user_id("github-user").await.unwrap().unwrap();
        assert!(github.verification.is_none());
        assert!(t.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_check_sign_up_num_expired_code() {
        let t = test_app().await;
        t.store
            .save_sign_up_code(
                "new@naver.com",
                &VerificationCode::new(654321, Utc::now() - chrono::Duration::minutes(11)),
            )
            .await
            .unwrap();

        let response = t
            .app
            .oneshot(get("/api/auth/checkSignUpNum?email=new@naver.com&authNum=654321"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: CheckAuthNumResponse = body_json(response).await;
        assert!(!body.success_yn);
    }

    #[tokio::test]
    async fn test_concurrent_password_updates_use_code_once() {
        let t = test_app().await;
        set_code(&t.store, 315572).await;
        let token = t.state.tokens.issue("tjddud").unwrap().token;

        let (first, second) = tokio::join!(
            t.app.clone().oneshot(password_request(&token, "tjddud", 315572)),
            t.app.clone().oneshot(password_request(&token, "tjddud", 315572)),
        );

        let mut statuses = [first.unwrap().status(), second.unwrap().status()];
        statuses.sort();
        assert_eq!(statuses, [StatusCode::OK, StatusCode::BAD_REQUEST]);
    }
}
