//! 이메일 인증번호.
//!
//! 6자리 인증번호와 발급 시각, 사용 여부를 함께 보관합니다.
//! 상태 전이는 `Issued -> Consumed | Expired` 이며, 새 인증번호를 요청하면
//! 이전 값은 덮어써집니다 (last write wins).

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{AuthError, AuthResult};

/// 인증번호 최솟값.
pub const CODE_MIN: u32 = 100_000;
/// 인증번호 최댓값.
pub const CODE_MAX: u32 = 999_999;

/// 인증번호 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeState {
    /// 발급됨 (사용 가능)
    Issued,
    /// 비밀번호 변경에 사용됨
    Consumed,
    /// 유효 시간 경과
    Expired,
}

/// 개발자 또는 가입 대기 이메일에 발급된 인증번호.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationCode {
    /// 6자리 인증번호
    pub value: u32,
    /// 발급 시각
    pub issued_at: DateTime<Utc>,
    /// 사용 여부
    pub consumed: bool,
}

impl VerificationCode {
    /// 주어진 값으로 인증번호 생성.
    pub fn new(value: u32, issued_at: DateTime<Utc>) -> Self {
        Self {
            value,
            issued_at,
            consumed: false,
        }
    }

    /// [`CODE_MIN`, `CODE_MAX`] 구간에서 균등하게 뽑은 인증번호 생성.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, issued_at: DateTime<Utc>) -> Self {
        Self::new(rng.gen_range(CODE_MIN..=CODE_MAX), issued_at)
    }

    /// 현재 상태 계산.
    pub fn state(&self, now: DateTime<Utc>, ttl: Duration) -> CodeState {
        if self.consumed {
            CodeState::Consumed
        } else if now > self.issued_at + ttl {
            CodeState::Expired
        } else {
            CodeState::Issued
        }
    }

    /// 제출된 값이 사용 가능한 인증번호와 일치하는지 확인 (소비하지 않음).
    pub fn matches(&self, submitted: u32, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.state(now, ttl) == CodeState::Issued && self.value == submitted
    }

    /// 일치하면 인증번호를 사용 처리합니다.
    ///
    /// # Errors
    ///
    /// 불일치, 만료, 이미 사용된 경우 `AuthError::InvalidVerificationCode`.
    pub fn consume(&mut self, submitted: u32, now: DateTime<Utc>, ttl: Duration) -> AuthResult<()> {
        if !self.matches(submitted, now, ttl) {
            return Err(AuthError::InvalidVerificationCode);
        }
        self.consumed = true;
        Ok(())
    }
}
