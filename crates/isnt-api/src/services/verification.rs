//! 이메일 인증번호 서비스.
//!
//! 인증번호 발급 → 저장 → 메일 발송을 한 번에 처리하고, 제출된 값을 비교합니다.
//! 동일 개발자에 대한 동시 발급 요청은 잠금 없이 마지막 저장이 이깁니다.
//! 발급은 인증번호 컬럼만 쓰므로 동시에 진행 중인 비밀번호 변경을 되돌리지 않습니다.

use std::sync::Arc;

use chrono::{Duration, Utc};
use isnt_core::{AuthError, AuthResult, Developer, VerificationCode};
use isnt_notification::{find_password_mail, sign_up_mail, MailDispatcher};
use tracing::{debug, info};

use crate::repository::CredentialStore;

/// 인증번호 발급 대상 조회 키.
#[derive(Debug, Clone, Copy)]
pub enum DeveloperLookup<'a> {
    UserId(&'a str),
    Email(&'a str),
}

/// Verification-Code Service.
#[derive(Clone)]
pub struct VerificationService {
    store: Arc<dyn CredentialStore>,
    mailer: Arc<dyn MailDispatcher>,
    ttl: Duration,
}

impl VerificationService {
    pub fn new(store: Arc<dyn CredentialStore>, mailer: Arc<dyn MailDispatcher>, ttl: Duration) -> Self {
        Self { store, mailer, ttl }
    }

    async fn resolve(&self, lookup: DeveloperLookup<'_>) -> AuthResult<Developer> {
        let developer = match lookup {
            DeveloperLookup::UserId(user_id) => self.store.find_by_user_id(user_id).await?,
            DeveloperLookup::Email(email) => self.store.find_by_email(email).await?,
        };
        developer.ok_or(AuthError::DeveloperNotFound)
    }

    /// 새 인증번호를 발급해 저장하고 개발자 이메일로 발송합니다.
    ///
    /// # Errors
    ///
    /// - 대상이 없으면 `DeveloperNotFound`
    /// - 이메일이 비어 있으면 `ExternalIdentityOnly`
    /// - 발송 실패는 재시도 없이 `Mail`
    pub async fn request_code(&self, lookup: DeveloperLookup<'_>) -> AuthResult<()> {
        let developer = self.resolve(lookup).await?;
        let to = developer.mail_address()?;

        let code = VerificationCode::generate(&mut rand::thread_rng(), Utc::now());
        let message = find_password_mail(to, code.value);

        self.store.set_code(developer.id, &code).await?;

        self.mailer.send(message).await?;

        info!(
            user_id = developer.user_id.as_deref().unwrap_or_default(),
            mailer = self.mailer.name(),
            "Verification code issued"
        );
        Ok(())
    }

    /// 제출된 값이 저장된 인증번호와 일치하는지 확인합니다. 인증번호는 소비하지 않습니다.
    ///
    /// 불일치, 미발급, 만료, 사용됨은 모두 `Ok(false)`입니다.
    pub async fn check_code(&self, user_id: &str, submitted: u32) -> AuthResult<bool> {
        let developer = self.resolve(DeveloperLookup::UserId(user_id)).await?;
        Ok(self.matches(&developer, submitted))
    }

    /// 개발자의 저장된 인증번호와 비교.
    pub fn matches(&self, developer: &Developer, submitted: u32) -> bool {
        developer
            .verification
            .as_ref()
            .is_some_and(|code| code.matches(submitted, Utc::now(), self.ttl))
    }

    /// 인증번호를 사용 처리하면서 비밀번호 해시를 교체합니다.
    ///
    /// 확인과 쓰기는 저장소에서 원자적으로 수행되므로 동시에 같은 인증번호를 제출해도
    /// 하나만 성공합니다.
    ///
    /// # Errors
    ///
    /// 미발급, 불일치, 만료, 사용됨은 `InvalidVerificationCode`.
    pub async fn consume_for_password(
        &self,
        developer: &Developer,
        submitted: u32,
        password_hash: &str,
    ) -> AuthResult<()> {
        let consumed = self
            .store
            .consume_code_and_set_password(developer.id, submitted, Utc::now(), self.ttl, password_hash)
            .await?;

        if !consumed {
            return Err(AuthError::InvalidVerificationCode);
        }
        Ok(())
    }

    /// 가입 대기 이메일로 인증번호를 발송합니다.
    ///
    /// # Errors
    ///
    /// 이메일이 비어 있으면 `ExternalIdentityOnly`.
    pub async fn request_sign_up_code(&self, email: &str) -> AuthResult<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::ExternalIdentityOnly);
        }

        let code = VerificationCode::generate(&mut rand::thread_rng(), Utc::now());
        let message = sign_up_mail(email, code.value);

        self.store.save_sign_up_code(email, &code).await?;
        self.mailer.send(message).await?;

        debug!(mailer = self.mailer.name(), "Sign-up code issued");
        Ok(())
    }

    /// 가입 인증번호 확인 (소비하지 않음).
    pub async fn check_sign_up_code(&self, email: &str, submitted: u32) -> AuthResult<bool> {
        let code = self.store.find_sign_up_code(email.trim()).await?;
        Ok(code.is_some_and(|c| c.matches(submitted, Utc::now(), self.ttl)))
    }
}
