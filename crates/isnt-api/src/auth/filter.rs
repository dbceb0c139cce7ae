//! 요청별 인증 필터.
//!
//! 라우트 디스패치 전에 한 번 실행되는 파이프라인 단계입니다.
//!
//! ```text
//! Unauthenticated ──(헤더 없음)──────────────> Anonymous 로 진행
//!        │
//!        └─(헤더 있음)─> TokenPresent ─┬─(검증 성공)─> Authenticated 로 진행
//!                                      └─(검증 실패)─> Rejected (401, 핸들러 미실행)
//! ```
//!
//! [`AccessPolicy`](super::AccessPolicy)의 요구 권한은 필터보다 먼저 한 번 조회됩니다.
//! 필터 제외 경로는 위 상태 기계를 건너뛰고, 결과 [`AuthContext`]는 요청 extension에
//! 저장되어 핸들러에서 추출됩니다.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap, HeaderName},
    middleware::Next,
    response::{IntoResponse, Response},
};
use isnt_core::{AuthError, AuthResult};
use tracing::debug;

use super::{Capability, TokenProvider};
use crate::error::ApiError;
use crate::state::AppState;

/// 요청의 인증 컨텍스트.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthContext {
    /// 토큰 헤더 없음
    Anonymous,
    /// 검증된 토큰의 subject
    Authenticated { subject: String },
}

impl AuthContext {
    /// 인증된 subject.
    pub fn subject(&self) -> Option<&str> {
        match self {
            AuthContext::Anonymous => None,
            AuthContext::Authenticated { subject } => Some(subject),
        }
    }
}

/// 헤더에서 토큰을 읽어 인증 컨텍스트를 결정하는 순수 함수.
///
/// 헤더 값은 `Bearer <token>` 또는 토큰 문자열 그대로를 허용합니다.
/// 헤더가 있지만 검증에 실패하면 `TokenInvalid` / `TokenExpired`를 반환합니다.
pub fn authenticate(
    headers: &HeaderMap,
    header: &HeaderName,
    tokens: &TokenProvider,
) -> AuthResult<AuthContext> {
    let Some(value) = headers.get(header) else {
        return Ok(AuthContext::Anonymous);
    };

    let value = value.to_str().map_err(|_| AuthError::TokenInvalid)?.trim();
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();

    let subject = tokens.validate(token)?;
    Ok(AuthContext::Authenticated { subject })
}

/// 인증 필터 + 접근 정책 미들웨어.
///
/// 요구 권한을 먼저 조회하고, 필터 제외(`Ignored`) 경로는 토큰 헤더를 읽지 않고 익명으로 통과시킵니다.
/// 그 외 경로의 토큰 검증 실패와 권한 부족은 이 단계에서 응답으로 종료되며 핸들러까지 전달되지 않습니다.
pub async fn auth_pipeline(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let required = state.policy.required(request.method(), request.uri().path());

    let context = if required == Capability::Ignored {
        AuthContext::Anonymous
    } else {
        match authenticate(request.headers(), &state.token_header, &state.tokens) {
            Ok(context) => context,
            Err(err) => {
                debug!(path = %request.uri().path(), error = %err, "Token rejected");
                return ApiError::from(err)
                    .with_request_info(request.method(), request.uri())
                    .into_response();
            }
        }
    };

    if let Err(err) = required.check(&context) {
        debug!(path = %request.uri().path(), "Protected route without token");
        return ApiError::from(err)
            .with_request_info(request.method(), request.uri())
            .into_response();
    }

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// 인증된 subject 추출기.
///
/// 필터가 저장한 컨텍스트가 `Authenticated`일 때만 성공합니다.
///
/// ```rust,ignore
/// async fn handler(Authenticated(subject): Authenticated) -> String {
///     subject
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Authenticated(pub String);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthContext>() {
            Some(AuthContext::Authenticated { subject }) => Ok(Authenticated(subject.clone())),
            _ => Err(AuthError::Unauthenticated.into()),
        }
    }
}

impl Authenticated {
    /// subject가 요청 대상 userId와 같은지 확인.
    ///
    /// # Errors
    ///
    /// 다르면 `AuthError::AuthorizationMismatch` (403).
    pub fn ensure_subject(&self, user_id: &str) -> AuthResult<()> {
        if self.0 == user_id {
            Ok(())
        } else {
            Err(AuthError::AuthorizationMismatch)
        }
    }
}
