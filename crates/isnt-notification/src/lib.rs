//! # Isnt Notification
//!
//! 인증번호 메일 발송 서비스.
//!
//! 지원 채널:
//! - SMTP ([`SmtpMailer`])
//! - 로그 출력 ([`LogMailer`], 개발 환경용)

pub mod logging;
pub mod messages;
pub mod smtp;
pub mod types;

pub use logging::LogMailer;
pub use messages::*;
pub use smtp::SmtpMailer;
pub use types::*;
