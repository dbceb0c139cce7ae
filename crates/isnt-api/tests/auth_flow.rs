//! 인증 흐름 통합 테스트.
//!
//! 로그인 → 인증번호 발송 → 확인 → 비밀번호 변경 → 재로그인 전체 경로를
//! HTTP 라우터를 통해 검증합니다.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use isnt_api::{create_router, AppState, CredentialStore, InMemoryCredentialStore};
use isnt_core::{AppConfig, AuthConfig, NewDeveloper, PasswordConfig, VerificationCode};
use isnt_notification::RecordingMailer;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

struct Harness {
    app: Router,
    state: Arc<AppState>,
    store: Arc<InMemoryCredentialStore>,
    mailer: Arc<RecordingMailer>,
}

fn config() -> AppConfig {
    AppConfig {
        auth: AuthConfig {
            jwt_secret: SecretString::new("integration-secret-key-at-least-32-bytes".into()),
            ..Default::default()
        },
        password: PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        ..Default::default()
    }
}

async fn harness() -> Harness {
    let store = Arc::new(InMemoryCredentialStore::new());
    let mailer = Arc::new(RecordingMailer::new());
    let state = Arc::new(AppState::new(config(), store.clone(), mailer.clone()).unwrap());

    store
        .create(NewDeveloper {
            user_id: Some("tjddud".to_string()),
            email: "tjddud@naver.com".to_string(),
            password_hash: state.auth.hash_password("aa12345^").await.unwrap(),
            name: "loginTester".to_string(),
            introduction: Some("안녕하세요".to_string()),
            git_url: Some("test git url".to_string()),
            web_site_url: Some("test web site url".to_string()),
            group_name: Some("test group".to_string()),
            picture_url: Some("testUrl".to_string()),
        })
        .await
        .unwrap();

    Harness {
        app: create_router(state.clone()),
        state,
        store,
        mailer,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, headers, body)
}

fn login_request(user_id: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "userId": user_id, "password": password }).to_string(),
        ))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn password_request(authorization: &str, user_id: &str, password: &str, auth_num: u32) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri("/api/auth/password")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, HeaderValue::from_str(authorization).unwrap())
        .body(Body::from(
            json!({ "userId": user_id, "password": password, "authNum": auth_num }).to_string(),
        ))
        .unwrap()
}

async fn set_code(store: &InMemoryCredentialStore, value: u32) {
    let developer = store.find_by_user_id("tjddud").await.unwrap().unwrap();
    store
        .set_code(developer.id, &VerificationCode::new(value, Utc::now()))
        .await
        .unwrap();
}

#[tokio::test]
async fn login_returns_profile_and_token() {
    let h = harness().await;

    let (status, headers, body) = send(&h.app, login_request("tjddud", "aa12345^")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["userId"], "tjddud");
    assert_eq!(body["groupName"], "test group");
    assert_eq!(body["point"], 0);

    let authorization = headers.get(header::AUTHORIZATION).unwrap().to_str().unwrap();
    let token = authorization.strip_prefix("Bearer ").unwrap();
    assert_eq!(h.state.tokens.validate(token).unwrap(), "tjddud");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let h = harness().await;

    let (status, headers, body) = send(&h.app, login_request("tjddud", "aa12345^^")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(headers.get(header::AUTHORIZATION).is_none());
    assert_eq!(body["code"], "AUTHENTICATION_FAILED");
}

#[tokio::test]
async fn check_auth_num_matches_stored_code() {
    let h = harness().await;
    set_code(&h.store, 315572).await;

    let (status, _, body) = send(&h.app, get("/api/auth/checkAuthNum/tjddud?authNum=315572")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "successYn": true }));

    let (status, _, body) = send(&h.app, get("/api/auth/checkAuthNum/tjddud?authNum=999999")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "successYn": false }));
}

#[tokio::test]
async fn password_reset_full_flow() {
    let h = harness().await;

    // 인증번호 발송 후 메일 본문의 값과 저장 값이 같아야 함
    let (status, _, _) = send(&h.app, get("/api/auth/sendAuthMail/tjddud")).await;
    assert_eq!(status, StatusCode::OK);

    let code = h
        .store
        .find_by_user_id("tjddud")
        .await
        .unwrap()
        .unwrap()
        .verification
        .unwrap()
        .value;
    let mail = h.mailer.last().unwrap();
    assert_eq!(mail.to, "tjddud@naver.com");
    assert!(mail.body.contains(&code.to_string()));

    // 확인은 인증번호를 소비하지 않음
    let uri = format!("/api/auth/checkAuthNum/tjddud?authNum={}", code);
    let (_, _, body) = send(&h.app, get(&uri)).await;
    assert_eq!(body["successYn"], true);

    let (_, headers, _) = send(&h.app, login_request("tjddud", "aa12345^")).await;
    let authorization = headers
        .get(header::AUTHORIZATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    let (status, _, _) = send(&h.app, password_request(&authorization, "tjddud", "2", code)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(&h.app, login_request("tjddud", "2")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(&h.app, login_request("tjddud", "aa12345^")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 사용된 인증번호는 더 이상 유효하지 않음
    let (_, _, body) = send(&h.app, get(&uri)).await;
    assert_eq!(body["successYn"], false);
    let (status, _, body) = send(&h.app, password_request(&authorization, "tjddud", "3", code)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_AUTH_NUM");
}

#[tokio::test]
async fn update_password_with_raw_token_header() {
    let h = harness().await;
    set_code(&h.store, 315572).await;
    let token = h.state.tokens.issue("tjddud").unwrap().token;

    let (status, _, _) = send(&h.app, password_request(&token, "tjddud", "2", 315572)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn update_password_for_other_subject_is_forbidden() {
    let h = harness().await;
    set_code(&h.store, 315572).await;
    let token = h.state.tokens.issue("intruder").unwrap().token;

    let (status, _, body) = send(
        &h.app,
        password_request(&format!("Bearer {}", token), "tjddud", "2", 315572),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "AUTHORIZATION_MISMATCH");

    // 비밀번호는 그대로
    let (status, _, _) = send(&h.app, login_request("tjddud", "aa12345^")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn tampered_token_is_rejected() {
    let h = harness().await;
    set_code(&h.store, 315572).await;

    let token = h.state.tokens.issue("tjddud").unwrap().token;
    // 서명 첫 글자 변경
    let idx = token.rfind('.').unwrap() + 1;
    let mut bytes = token.into_bytes();
    bytes[idx] = if bytes[idx] == b'A' { b'B' } else { b'A' };
    let tampered = String::from_utf8(bytes).unwrap();

    let (status, _, body) = send(
        &h.app,
        password_request(&format!("Bearer {}", tampered), "tjddud", "2", 315572),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_TOKEN");
}

#[tokio::test]
async fn health_endpoints_are_public() {
    let h = harness().await;

    let (status, _, _) = send(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = send(&h.app, get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}
