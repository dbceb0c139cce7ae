//! 인증 도메인 에러 타입.
//!
//! 서비스 계층에서 발생한 에러는 이 타입 그대로 컨트롤러 경계까지 전파되며,
//! HTTP 상태 코드 변환은 API 크레이트의 경계 계층에서만 수행합니다.

use thiserror::Error;

/// 인증/인가 도메인 에러.
#[derive(Debug, Error)]
pub enum AuthError {
    /// 요청한 userId/email에 해당하는 개발자가 없음
    #[error("개발자를 찾을 수 없습니다")]
    DeveloperNotFound,

    /// 이메일이 없는 외부 인증(GitHub) 계정에 메일 인증을 시도함
    #[error("외부 인증 계정은 이메일 인증을 사용할 수 없습니다")]
    ExternalIdentityOnly,

    /// 아이디 또는 비밀번호 불일치
    #[error("아이디 또는 비밀번호가 일치하지 않습니다")]
    AuthenticationFailed,

    /// 서명 불일치 또는 잘못된 토큰 형식
    #[error("유효하지 않은 토큰")]
    TokenInvalid,

    /// 만료된 토큰
    #[error("토큰이 만료되었습니다")]
    TokenExpired,

    /// 토큰의 subject와 요청 대상 userId가 다름
    #[error("요청 대상과 인증된 사용자가 일치하지 않습니다")]
    AuthorizationMismatch,

    /// 인증번호 불일치, 만료 또는 이미 사용됨
    #[error("인증번호가 유효하지 않습니다")]
    InvalidVerificationCode,

    /// 보호된 경로에 토큰 없이 접근
    #[error("인증 토큰이 필요합니다")]
    Unauthenticated,

    /// 메일 발송 실패
    #[error("메일 발송 실패: {0}")]
    Mail(String),

    /// 자격증명 저장소 에러
    #[error("저장소 에러: {0}")]
    Storage(String),

    /// 해싱/서명 등 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

/// 인증 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// 응답 본문에 실리는 에러 코드.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::DeveloperNotFound => "DEVELOPER_NOT_FOUND",
            AuthError::ExternalIdentityOnly => "EXTERNAL_IDENTITY_ONLY",
            AuthError::AuthenticationFailed => "AUTHENTICATION_FAILED",
            AuthError::TokenInvalid => "INVALID_TOKEN",
            AuthError::TokenExpired => "TOKEN_EXPIRED",
            AuthError::AuthorizationMismatch => "AUTHORIZATION_MISMATCH",
            AuthError::InvalidVerificationCode => "INVALID_AUTH_NUM",
            AuthError::Unauthenticated => "MISSING_TOKEN",
            AuthError::Mail(_) => "MAIL_ERROR",
            AuthError::Storage(_) => "STORAGE_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
