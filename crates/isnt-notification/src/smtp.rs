//! SMTP 메일 발송.
//!
//! lettre의 동기 `SmtpTransport`를 blocking 스레드에서 실행합니다.

use async_trait::async_trait;
use isnt_core::MailConfig;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::PoolConfig;
use lettre::{Message, SmtpTransport, Transport};
use secrecy::ExposeSecret;
use tracing::{debug, error};

use crate::types::{MailDispatcher, MailError, MailMessage, MailResult};

/// SMTP dispatcher.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: SmtpTransport,
    from: Mailbox,
}

impl SmtpMailer {
    /// 메일 설정으로 SMTP 전송 계층 생성.
    ///
    /// # Errors
    ///
    /// 발신 주소 형식이 잘못되었거나 relay 호스트를 해석할 수 없으면 에러.
    pub fn from_config(config: &MailConfig) -> MailResult<Self> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from.clone()))?;

        let transport = SmtpTransport::relay(&config.smtp_host)
            .map_err(|e| MailError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().to_string(),
            ))
            .pool_config(PoolConfig::new().max_size(4))
            .build();

        Ok(Self { transport, from })
    }

    fn build_message(&self, message: &MailMessage) -> MailResult<Message> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|_| MailError::InvalidAddress(message.to.clone()))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(message.body.clone())
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailDispatcher for SmtpMailer {
    async fn send(&self, message: MailMessage) -> MailResult<()> {
        let email = self.build_message(&message)?;
        let transport = self.transport.clone();

        tokio::task::spawn_blocking(move || transport.send(&email))
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?
            .map_err(|e| {
                error!(to = %message.to, error = %e, "SMTP send failed");
                MailError::Transport(e.to_string())
            })?;

        debug!(to = %message.to, "Mail sent via SMTP");
        Ok(())
    }

    fn name(&self) -> &str {
        "smtp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_from_address_rejected() {
        let config = MailConfig {
            from: "not an address".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            SmtpMailer::from_config(&config),
            Err(MailError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let mailer = SmtpMailer::from_config(&MailConfig::default()).unwrap();
        let result = mailer.build_message(&MailMessage::new("bad address", "s", "b"));
        assert!(matches!(result, Err(MailError::InvalidAddress(_))));

        let ok = mailer.build_message(&MailMessage::new("tjddud@naver.com", "s", "b"));
        assert!(ok.is_ok());
    }
}
