//! 로그 출력 dispatcher.
//!
//! SMTP가 설정되지 않은 개발 환경에서 사용합니다. 본문은 기록하지 않습니다.

use async_trait::async_trait;
use tracing::info;

use crate::types::{MailDispatcher, MailMessage, MailResult};

/// 메일을 발송하지 않고 수신자와 제목만 로그로 남기는 dispatcher.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl MailDispatcher for LogMailer {
    async fn send(&self, message: MailMessage) -> MailResult<()> {
        info!(to = %message.to, subject = %message.subject, "Mail dispatch skipped (log mailer)");
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}
