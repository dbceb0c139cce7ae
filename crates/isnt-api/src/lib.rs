//! 인증 REST API 서버.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (로그인, 인증번호, 비밀번호 변경)
//! - JWT Access Token 발급/검증과 요청별 인증 필터
//! - 경로별 접근 정책
//! - 자격증명 저장소 (PostgreSQL / 메모리)
//! - 헬스 체크 엔드포인트
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`auth`]: Token Provider, 비밀번호 해싱, 인증 필터, 접근 정책
//! - [`services`]: 로그인/비밀번호 변경, 인증번호 서비스
//! - [`repository`]: 자격증명 저장소
//! - [`error`]: 도메인 에러 → HTTP 응답 변환

pub mod auth;
pub mod error;
pub mod repository;
pub mod routes;
pub mod services;
pub mod state;

pub use auth::{AccessPolicy, AuthContext, Authenticated, Claims, PasswordHasher, TokenProvider};
pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use repository::{CredentialStore, InMemoryCredentialStore, PgCredentialStore, StoreError};
pub use routes::{create_api_router, create_router};
pub use services::{AuthService, DeveloperLookup, VerificationService};
pub use state::{AppState, StateError};

#[cfg(any(test, feature = "test-utils"))]
pub use state::{create_test_state, create_test_state_with, test_config};

/// 데이터베이스 마이그레이션.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");
