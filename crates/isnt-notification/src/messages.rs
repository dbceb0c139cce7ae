//! 인증번호 메일 본문.

use crate::types::MailMessage;

/// 인증 메일 제목.
pub const AUTH_EMAIL_TITLE: &str = "[isnt] 이메일 인증번호 안내";

/// 비밀번호 찾기 인증 메일.
pub fn find_password_mail(to: &str, auth_num: u32) -> MailMessage {
    MailMessage::new(
        to,
        AUTH_EMAIL_TITLE,
        format!(
            "비밀번호 변경을 위한 인증번호는 [{}] 입니다.\n본인이 요청하지 않았다면 이 메일을 무시하세요.",
            auth_num
        ),
    )
}

/// 회원가입 인증 메일.
pub fn sign_up_mail(to: &str, auth_num: u32) -> MailMessage {
    MailMessage::new(
        to,
        AUTH_EMAIL_TITLE,
        format!("회원가입을 위한 인증번호는 [{}] 입니다.", auth_num),
    )
}
