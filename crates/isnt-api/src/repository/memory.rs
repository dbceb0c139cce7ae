//! 메모리 자격증명 저장소.
//!
//! 데이터베이스 URL이 설정되지 않은 개발 환경과 테스트에서 사용합니다.
//! 프로세스 종료 시 데이터는 사라집니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use isnt_core::{Developer, NewDeveloper, VerificationCode};
use tokio::sync::RwLock;

use super::{CredentialStore, StoreError, StoreResult};

/// 메모리 기반 [`CredentialStore`].
#[derive(Debug)]
pub struct InMemoryCredentialStore {
    developers: RwLock<HashMap<i64, Developer>>,
    sign_up_codes: RwLock<HashMap<String, VerificationCode>>,
    next_id: AtomicI64,
}

impl Default for InMemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            developers: RwLock::new(HashMap::new()),
            sign_up_codes: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<Developer>> {
        let developers = self.developers.read().await;
        Ok(developers
            .values()
            .find(|d| d.user_id.as_deref() == Some(user_id))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Developer>> {
        if email.trim().is_empty() {
            return Ok(None);
        }

        let developers = self.developers.read().await;
        Ok(developers.values().find(|d| d.email == email).cloned())
    }

    async fn create(&self, new: NewDeveloper) -> StoreResult<Developer> {
        let mut developers = self.developers.write().await;

        if let Some(user_id) = new.user_id.as_deref() {
            if developers.values().any(|d| d.user_id.as_deref() == Some(user_id)) {
                return Err(StoreError::Duplicate {
                    field: "user_id",
                    value: user_id.to_string(),
                });
            }
        }
        if !new.email.is_empty() && developers.values().any(|d| d.email == new.email) {
            return Err(StoreError::Duplicate {
                field: "email",
                value: new.email,
            });
        }

        let developer = Developer {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            user_id: new.user_id,
            email: new.email,
            password_hash: new.password_hash,
            name: new.name,
            introduction: new.introduction,
            git_url: new.git_url,
            web_site_url: new.web_site_url,
            group_name: new.group_name,
            picture_url: new.picture_url,
            point: 0,
            popularity: 0,
            verification: None,
        };

        developers.insert(developer.id, developer.clone());
        Ok(developer)
    }

    async fn set_code(&self, id: i64, code: &VerificationCode) -> StoreResult<()> {
        let mut developers = self.developers.write().await;
        let developer = developers.get_mut(&id).ok_or(StoreError::Missing(id))?;
        developer.verification = Some(code.clone());
        Ok(())
    }

    async fn consume_code_and_set_password(
        &self,
        id: i64,
        auth_num: u32,
        now: DateTime<Utc>,
        ttl: Duration,
        password_hash: &str,
    ) -> StoreResult<bool> {
        // 확인과 쓰기를 같은 write lock 안에서 수행
        let mut developers = self.developers.write().await;
        let Some(developer) = developers.get_mut(&id) else {
            return Ok(false);
        };

        let consumed = developer
            .verification
            .as_mut()
            .is_some_and(|code| code.consume(auth_num, now, ttl).is_ok());
        if consumed {
            developer.password_hash = password_hash.to_string();
        }
        Ok(consumed)
    }

    async fn save_sign_up_code(&self, email: &str, code: &VerificationCode) -> StoreResult<()> {
        self.sign_up_codes
            .write()
            .await
            .insert(email.to_string(), code.clone());
        Ok(())
    }

    async fn find_sign_up_code(&self, email: &str) -> StoreResult<Option<VerificationCode>> {
        Ok(self.sign_up_codes.read().await.get(email).cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
