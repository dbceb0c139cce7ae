//! API 에러 응답 타입.
//!
//! 도메인 에러(`AuthError`)를 HTTP 상태 코드와 일관된 JSON 본문으로 변환합니다.
//! 상태 코드 매핑은 이 모듈에서만 수행됩니다.

use axum::{
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use isnt_core::AuthError;
use serde::{Deserialize, Serialize};
use tracing::error;

/// API 에러 응답 본문.
///
/// ```json
/// {
///   "code": "DEVELOPER_NOT_FOUND",
///   "message": "개발자를 찾을 수 없습니다",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "INVALID_TOKEN", "INVALID_AUTH_NUM")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// HTTP 메서드
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// 요청 경로
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Some(chrono::Utc::now().timestamp()),
            method: None,
            path: None,
        }
    }

    /// 요청 정보(메서드, 경로)를 추가합니다.
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.method = Some(method.to_string());
        self.path = Some(uri.path().to_string());
        self
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiErrorResponse {}

/// 도메인 에러의 HTTP 상태 코드.
pub fn status_of(err: &AuthError) -> StatusCode {
    match err {
        AuthError::DeveloperNotFound => StatusCode::NOT_FOUND,
        AuthError::ExternalIdentityOnly => StatusCode::CONFLICT,
        AuthError::AuthenticationFailed
        | AuthError::TokenInvalid
        | AuthError::TokenExpired
        | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AuthError::AuthorizationMismatch => StatusCode::FORBIDDEN,
        AuthError::InvalidVerificationCode => StatusCode::BAD_REQUEST,
        AuthError::Mail(_) => StatusCode::BAD_GATEWAY,
        AuthError::Storage(_) | AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// 핸들러/미들웨어 경계의 에러.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
}

impl ApiError {
    #[must_use]
    pub fn with_request_info(mut self, method: &Method, uri: &Uri) -> Self {
        self.body = self.body.with_request_info(method, uri);
        self
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let status = status_of(&err);

        // 내부 상세는 로그에만 남기고 응답에는 일반 메시지만 노출
        let message = match &err {
            AuthError::Storage(detail) | AuthError::Internal(detail) => {
                error!(code = err.code(), detail = %detail, "Internal error");
                "요청을 처리하는 중 오류가 발생했습니다".to_string()
            }
            AuthError::Mail(detail) => {
                error!(detail = %detail, "Mail dispatch failed");
                "인증 메일을 발송하지 못했습니다".to_string()
            }
            other => other.to_string(),
        };

        Self {
            status,
            body: ApiErrorResponse::new(err.code(), message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
