//! 메일 타입 및 trait 정의.

use async_trait::async_trait;
use isnt_core::AuthError;

/// 발송할 메일.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    /// 수신 주소
    pub to: String,
    /// 제목
    pub subject: String,
    /// 본문 (plain text)
    pub body: String,
}

impl MailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// 메일 발송 에러.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("잘못된 메일 주소: {0}")]
    InvalidAddress(String),
    #[error("메일 생성 실패: {0}")]
    Build(String),
    #[error("SMTP 전송 실패: {0}")]
    Transport(String),
}

impl From<MailError> for AuthError {
    fn from(err: MailError) -> Self {
        AuthError::Mail(err.to_string())
    }
}

/// 메일 발송 Result 타입.
pub type MailResult<T> = Result<T, MailError>;

/// 메일 발송 trait.
///
/// 호출은 동기적으로 완료까지 대기하며 재시도하지 않습니다.
/// 실패는 그대로 호출자에게 전파됩니다.
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    /// 메일 발송.
    async fn send(&self, message: MailMessage) -> MailResult<()>;

    /// 발송 채널 이름 (로그용).
    fn name(&self) -> &str;
}

/// 발송된 메일을 메모리에 기록하는 테스트용 dispatcher.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: std::sync::Mutex<Vec<MailMessage>>,
    fail: std::sync::atomic::AtomicBool,
}

#[cfg(any(test, feature = "test-utils"))]
impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 이후 발송을 모두 실패시킵니다.
    pub fn fail_next_sends(&self, fail: bool) {
        self.fail.store(fail, std::sync::atomic::Ordering::SeqCst);
    }

    /// 지금까지 발송된 메일.
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// 마지막으로 발송된 메일.
    pub fn last(&self) -> Option<MailMessage> {
        self.sent().pop()
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl MailDispatcher for RecordingMailer {
    async fn send(&self, message: MailMessage) -> MailResult<()> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(MailError::Transport("forced failure".to_string()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message);
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
