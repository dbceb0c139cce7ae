//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/auth` - 로그인, 인증번호, 비밀번호 변경
//!
//! 모든 라우트는 인증 필터와 접근 정책 미들웨어를 거칩니다.

pub mod auth;
pub mod health;

pub use auth::{auth_router, CheckAuthNumResponse, LoginRequest, UpdatePasswordRequest};
pub use health::{health_router, ComponentState, HealthResponse, ServiceState};

use axum::{middleware, Router};
use std::sync::Arc;

use crate::auth::auth_pipeline;
use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 인증 필터는 라우팅 이후 핸들러 실행 전에 요청마다 한 번 실행됩니다.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .nest("/api/auth", auth_router())
}

/// 인증 미들웨어와 상태가 적용된 라우터 생성.
pub fn create_router(state: Arc<AppState>) -> Router {
    create_api_router()
        .layer(middleware::from_fn_with_state(state.clone(), auth_pipeline))
        .with_state(state)
}
