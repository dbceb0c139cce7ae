//! 로그인 및 비밀번호 변경 흐름.

use std::sync::Arc;

use isnt_core::{AuthError, AuthResult, PublicProfile};
use tracing::{info, warn};

use super::VerificationService;
use crate::auth::{AccessToken, PasswordHasher, TokenProvider};
use crate::repository::CredentialStore;

/// 로그인 결과.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: AccessToken,
    pub profile: PublicProfile,
}

/// 인증 서비스.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenProvider>,
    verification: VerificationService,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenProvider>,
        verification: VerificationService,
    ) -> Self {
        Self {
            store,
            hasher,
            tokens,
            verification,
        }
    }

    /// userId + 비밀번호로 로그인.
    ///
    /// # Errors
    ///
    /// - userId가 없으면 `DeveloperNotFound`
    /// - 비밀번호 불일치는 `AuthenticationFailed` (토큰 미발급)
    pub async fn login(&self, user_id: &str, password: &str) -> AuthResult<LoginOutcome> {
        let developer = self
            .store
            .find_by_user_id(user_id)
            .await?
            .ok_or(AuthError::DeveloperNotFound)?;

        // 외부 인증 계정은 비밀번호가 없음
        if developer.password_hash.is_empty() {
            warn!(user_id, "Password login attempted on account without password");
            return Err(AuthError::AuthenticationFailed);
        }

        let verified = self.verify_password(password, &developer.password_hash).await?;
        if !verified {
            warn!(user_id, "Login failed: password mismatch");
            return Err(AuthError::AuthenticationFailed);
        }

        let token = self.tokens.issue(user_id)?;
        info!(user_id, "Login succeeded");

        Ok(LoginOutcome {
            token,
            profile: developer.public_profile(),
        })
    }

    /// 인증번호 확인 후 비밀번호 변경.
    ///
    /// 토큰 subject와 `user_id` 일치 여부는 호출 전에 확인되어야 합니다.
    ///
    /// # Errors
    ///
    /// - userId가 없으면 `DeveloperNotFound`
    /// - 인증번호 불일치/만료/사용됨은 `InvalidVerificationCode`
    pub async fn update_password(&self, user_id: &str, new_password: &str, auth_num: u32) -> AuthResult<()> {
        let developer = self
            .store
            .find_by_user_id(user_id)
            .await?
            .ok_or(AuthError::DeveloperNotFound)?;

        // 틀린 인증번호에는 해싱 비용을 쓰지 않음 (최종 판정은 저장소의 조건부 갱신)
        if !self.verification.matches(&developer, auth_num) {
            return Err(AuthError::InvalidVerificationCode);
        }

        let password_hash = self.hash_password(new_password).await?;
        self.verification
            .consume_for_password(&developer, auth_num, &password_hash)
            .await?;

        info!(user_id, "Password updated");
        Ok(())
    }

    /// 비밀번호 해싱 (blocking 스레드).
    pub async fn hash_password(&self, plaintext: &str) -> AuthResult<String> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();

        let digest = tokio::task::spawn_blocking(move || hasher.hash(&plaintext))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;
        Ok(digest)
    }

    async fn verify_password(&self, plaintext: &str, digest: &str) -> AuthResult<bool> {
        let hasher = self.hasher.clone();
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();

        let verified = tokio::task::spawn_blocking(move || hasher.verify(&plaintext, &digest))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;
        Ok(verified)
    }
}
