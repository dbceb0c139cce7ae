//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 설정은 시작 시 한 번 읽어 Token Provider, Password Hasher, 접근 정책, 서비스에
//! 주입되고 상태에는 보관하지 않습니다. 요청 간 공유되는 가변 자원은 자격증명 저장소뿐입니다.

use std::sync::Arc;

use axum::http::HeaderName;
use chrono::Duration;
use isnt_core::AppConfig;
use isnt_notification::MailDispatcher;

use crate::auth::{AccessPolicy, PasswordError, PasswordHasher, PolicyError, TokenProvider};
use crate::repository::CredentialStore;
use crate::services::{AuthService, VerificationService};

/// 상태 구성 에러.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("잘못된 토큰 헤더 이름: {0}")]
    TokenHeader(String),
}

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 `Arc<AppState>`로 핸들러에 주입됩니다.
pub struct AppState {
    /// Access Token 발급/검증
    pub tokens: Arc<TokenProvider>,

    /// 토큰을 싣는 헤더
    pub token_header: HeaderName,

    /// 경로별 접근 정책
    pub policy: AccessPolicy,

    /// 자격증명 저장소 (PostgreSQL 또는 메모리)
    pub store: Arc<dyn CredentialStore>,

    /// 메일 발송 채널
    pub mailer: Arc<dyn MailDispatcher>,

    /// 로그인 / 비밀번호 변경
    pub auth: AuthService,

    /// 인증번호 발급 / 확인
    pub verification: VerificationService,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 설정과 외부 협력자(저장소, 메일)로 상태 생성.
    pub fn new(
        config: AppConfig,
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn MailDispatcher>,
    ) -> Result<Self, StateError> {
        let tokens = Arc::new(TokenProvider::new(&config.auth));
        let hasher = PasswordHasher::new(&config.password)?;
        let policy = AccessPolicy::from_rules(&config.auth.ignored_paths, &config.auth.public_paths)?;
        let token_header = HeaderName::from_bytes(config.auth.token_header.as_bytes())
            .map_err(|_| StateError::TokenHeader(config.auth.token_header.clone()))?;

        let verification = VerificationService::new(
            store.clone(),
            mailer.clone(),
            Duration::minutes(config.auth.verification_code_ttl_minutes),
        );
        let auth = AuthService::new(store.clone(), hasher, tokens.clone(), verification.clone());

        Ok(Self {
            tokens,
            token_header,
            policy,
            store,
            mailer,
            auth,
            verification,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 테스트용 설정.
///
/// 해싱 비용을 최소로 낮추고 고정 서명 키를 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn test_config() -> AppConfig {
    use isnt_core::{AuthConfig, PasswordConfig};
    use secrecy::SecretString;

    AppConfig {
        auth: AuthConfig {
            jwt_secret: SecretString::new("test-secret-key-for-jwt-testing-minimum-32-chars".into()),
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

/// 지정한 저장소와 메일 채널로 테스트용 AppState 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state_with(
    store: Arc<dyn CredentialStore>,
    mailer: Arc<dyn MailDispatcher>,
) -> AppState {
    AppState::new(test_config(), store, mailer).expect("test state")
}

/// 테스트용 AppState 생성 헬퍼.
///
/// 실제 DB/SMTP 연결 없이 메모리 저장소와 기록용 메일 채널을 사용합니다.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use crate::repository::InMemoryCredentialStore;
    use isnt_notification::RecordingMailer;

    create_test_state_with(
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(RecordingMailer::new()),
    )
}
