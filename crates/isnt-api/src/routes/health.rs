//! 헬스 체크 endpoint.
//!
//! `/health`는 프로세스 생존 여부만, `/health/ready`는 자격증명 저장소 연결까지 확인합니다.
//! 두 경로 모두 접근 정책상 공개 경로입니다.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// 서비스 전체 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Healthy,
    Unhealthy,
}

/// 컴포넌트 연결 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Up,
    Down,
}

/// Readiness 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ServiceState,
    pub version: String,
    pub uptime_secs: i64,
    pub timestamp: DateTime<Utc>,
    pub components: ComponentHealth,
}

/// 의존 컴포넌트별 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub credential_store: ComponentStatus,
    /// 메일 채널은 발송 시점에만 연결하므로 구현체 이름만 보고합니다.
    pub mailer: ComponentStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub state: ComponentState,
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ComponentStatus {
    fn up(backend: &str) -> Self {
        Self {
            state: ComponentState::Up,
            backend: backend.to_string(),
            error: None,
        }
    }

    fn down(backend: &str, error: String) -> Self {
        Self {
            state: ComponentState::Down,
            backend: backend.to_string(),
            error: Some(error),
        }
    }
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}

/// GET /health/ready
///
/// 저장소 ping이 실패하면 503을 반환합니다.
pub async fn health_ready(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let backend = state.store.name();
    let credential_store = match state.store.ping().await {
        Ok(()) => ComponentStatus::up(backend),
        Err(err) => {
            warn!(backend, error = %err, "Credential store ping failed");
            ComponentStatus::down(backend, "연결 실패".to_string())
        }
    };

    let (status, code) = match credential_store.state {
        ComponentState::Up => (ServiceState::Healthy, StatusCode::OK),
        ComponentState::Down => (ServiceState::Unhealthy, StatusCode::SERVICE_UNAVAILABLE),
    };

    let response = HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: Utc::now(),
        components: ComponentHealth {
            credential_store,
            mailer: ComponentStatus::up(state.mailer.name()),
        },
    };

    (code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
