//! 자격증명 저장소 (Credential Store).
//!
//! 개발자 레코드와 인증번호를 보관합니다. 서비스 계층은 [`CredentialStore`] trait에만
//! 의존하며, 운영 환경은 PostgreSQL, 개발/테스트 환경은 메모리 구현을 사용합니다.
//!
//! "레코드 없음"은 `Ok(None)`으로, 저장소 장애는 `Err`로 구분됩니다.
//!
//! 쓰기는 필요한 컬럼만 갱신합니다. 인증번호 발급은 `auth_num*` 컬럼만, 비밀번호 변경은
//! 인증번호 사용 처리와 함께 하나의 조건부 갱신으로 수행되어 동시 요청이 서로의 쓰기를
//! 덮어쓰지 않고, 하나의 인증번호는 최대 한 번만 사용됩니다.

pub mod developers;
pub mod memory;

pub use developers::PgCredentialStore;
pub use memory::InMemoryCredentialStore;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use isnt_core::{AuthError, Developer, NewDeveloper, VerificationCode};

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("데이터베이스 에러: {0}")]
    Database(#[from] sqlx::Error),
    #[error("이미 존재하는 {field}: {value}")]
    Duplicate { field: &'static str, value: String },
    #[error("존재하지 않는 개발자 id: {0}")]
    Missing(i64),
    #[error("잘못된 저장 값: {0}")]
    Corrupted(String),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Storage(err.to_string())
    }
}

/// 저장소 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 개발자 자격증명 저장소.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// userId로 개발자 조회.
    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<Developer>>;

    /// 이메일로 개발자 조회.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Developer>>;

    /// 개발자 생성.
    ///
    /// `user_id` 또는 비어 있지 않은 `email`이 이미 존재하면 `StoreError::Duplicate`.
    async fn create(&self, developer: NewDeveloper) -> StoreResult<Developer>;

    /// 개발자의 인증번호를 새 값으로 교체 (다른 컬럼은 건드리지 않음).
    ///
    /// 대상이 없으면 `StoreError::Missing`.
    async fn set_code(&self, id: i64, code: &VerificationCode) -> StoreResult<()>;

    /// 인증번호가 `now` 기준 사용 가능하고 `auth_num`과 같을 때만 사용 처리하고
    /// 비밀번호 해시를 교체합니다. 확인과 쓰기는 원자적입니다.
    ///
    /// 조건이 맞지 않으면 아무것도 바꾸지 않고 `Ok(false)`.
    async fn consume_code_and_set_password(
        &self,
        id: i64,
        auth_num: u32,
        now: DateTime<Utc>,
        ttl: Duration,
        password_hash: &str,
    ) -> StoreResult<bool>;

    /// 가입 대기 이메일의 인증번호 저장 (기존 값 덮어씀).
    async fn save_sign_up_code(&self, email: &str, code: &VerificationCode) -> StoreResult<()>;

    /// 가입 대기 이메일의 인증번호 조회.
    async fn find_sign_up_code(&self, email: &str) -> StoreResult<Option<VerificationCode>>;

    /// 연결 상태 확인.
    async fn ping(&self) -> StoreResult<()>;

    /// 저장소 이름 (로그/헬스 체크용).
    fn name(&self) -> &str;
}
