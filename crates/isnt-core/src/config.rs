//! 설정 관리.
//!
//! 프로세스 시작 시 한 번 로드되어 `Arc`로 각 구성 요소에 전달됩니다.
//! 우선순위: 기본값 < 설정 파일 < 환경 변수 (`ISNT__AUTH__JWT_SECRET` 형식).

use std::path::Path;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

/// 서명 키 최소 길이 (바이트).
pub const MIN_SECRET_LEN: usize = 32;

/// 애플리케이션 설정.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 비밀번호 해싱 설정
    pub password: PasswordConfig,
    /// 메일 설정
    pub mail: MailConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 허용 CORS origin 목록 (비어 있으면 전체 허용)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors_origins: Vec::new(),
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// 연결 URL (없으면 인메모리 저장소 사용)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connection_timeout_secs: u64,
    /// 시작 시 마이그레이션 실행 여부
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            connection_timeout_secs: 10,
            run_migrations: true,
        }
    }
}

/// 인증 설정.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 서명 키
    #[serde(deserialize_with = "deserialize_secret")]
    pub jwt_secret: SecretString,
    /// Access Token 유효 시간 (분)
    pub access_token_ttl_minutes: i64,
    /// Access Token을 싣는 헤더 이름
    pub token_header: String,
    /// 인증번호 유효 시간 (분)
    pub verification_code_ttl_minutes: i64,
    /// 인증 필터를 거치지 않는 경로 규칙. 토큰 헤더가 있어도 검증하지 않습니다.
    pub ignored_paths: Vec<String>,
    /// 토큰 없이 접근 가능한 경로 규칙 (`"METHOD /pattern"`, METHOD는 `*` 가능)
    pub public_paths: Vec<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: SecretString::new(String::new().into()),
            access_token_ttl_minutes: 60,
            token_header: "Authorization".to_string(),
            verification_code_ttl_minutes: 10,
            ignored_paths: to_rules(&["OPTIONS /api/**", "* /api/developer/**", "* /api/auth/login"]),
            public_paths: to_rules(&["GET /health/**", "GET /api/**"]),
        }
    }
}

fn to_rules(rules: &[&str]) -> Vec<String> {
    rules.iter().map(|s| s.to_string()).collect()
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(SecretString::new(raw.into()))
}

/// Argon2 비밀번호 해싱 비용.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    /// 메모리 비용 (KiB)
    pub memory_kib: u32,
    /// 반복 횟수
    pub iterations: u32,
    /// 병렬도
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        // argon2 크레이트 기본값과 동일 (m=19456, t=2, p=1)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// 메일 발송 설정.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// SMTP 발송 활성화 (비활성 시 로그로만 기록)
    pub enabled: bool,
    /// SMTP 호스트
    pub smtp_host: String,
    /// SMTP 포트
    pub smtp_port: u16,
    /// SMTP 사용자
    pub username: String,
    /// SMTP 비밀번호
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: SecretString,
    /// 발신 주소
    pub from: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_host: "smtp.gmail.com".to_string(),
            smtp_port: 465,
            username: String::new(),
            password: SecretString::new(String::new().into()),
            from: "isnt <noreply@isnt.dev>".to_string(),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "isnt_api=info,tower_http=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 설정 검증 에러.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),
    #[error("JWT 서명 키는 최소 32바이트 이상이어야 합니다")]
    WeakSecret,
    #[error("유효 시간은 0보다 커야 합니다: {0}")]
    InvalidTtl(&'static str),
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("ISNT")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.ignored_paths")
                    .with_list_parse_key("auth.public_paths")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.toml")
    }

    /// 서명 키 길이와 유효 시간을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.expose_secret().len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }
        if self.auth.access_token_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidTtl("auth.access_token_ttl_minutes"));
        }
        if self.auth.verification_code_ttl_minutes <= 0 {
            return Err(ConfigError::InvalidTtl("auth.verification_code_ttl_minutes"));
        }
        Ok(())
    }
}
