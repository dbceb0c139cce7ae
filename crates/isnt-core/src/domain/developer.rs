//! 개발자 계정.

use serde::{Deserialize, Serialize};

use super::VerificationCode;
use crate::error::{AuthError, AuthResult};

/// 개발자 계정 레코드.
///
/// `user_id`가 없으면 외부 인증(GitHub) 연동으로만 식별되는 계정이며,
/// 이 경우 `email`이 빈 문자열일 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Developer {
    /// 내부 식별자
    pub id: i64,
    /// 로그인 아이디
    pub user_id: Option<String>,
    /// 이메일 (외부 인증 계정은 빈 문자열)
    pub email: String,
    /// PHC 형식 비밀번호 해시
    pub password_hash: String,
    /// 이름
    pub name: String,
    /// 소개
    pub introduction: Option<String>,
    /// 깃 주소
    pub git_url: Option<String>,
    /// 웹사이트(블로그) 주소
    pub web_site_url: Option<String>,
    /// 소속
    pub group_name: Option<String>,
    /// 사진 경로
    pub picture_url: Option<String>,
    /// 점수
    pub point: i32,
    /// 인기도
    pub popularity: i32,
    /// 마지막으로 발급된 인증번호
    pub verification: Option<VerificationCode>,
}

impl Developer {
    /// 메일 인증에 사용할 주소.
    ///
    /// # Errors
    ///
    /// 이메일이 비어 있으면 `AuthError::ExternalIdentityOnly`.
    pub fn mail_address(&self) -> AuthResult<&str> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(AuthError::ExternalIdentityOnly);
        }
        Ok(email)
    }

    /// 로그인 응답에 실리는 공개 프로필.
    pub fn public_profile(&self) -> PublicProfile {
        PublicProfile {
            user_id: self.user_id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            introduction: self.introduction.clone(),
            git_url: self.git_url.clone(),
            web_site_url: self.web_site_url.clone(),
            group_name: self.group_name.clone(),
            picture_url: self.picture_url.clone(),
            point: self.point,
            popularity: self.popularity,
        }
    }
}

/// 신규 개발자 입력 (비밀번호는 이미 해싱된 상태).
#[derive(Debug, Clone, Default)]
pub struct NewDeveloper {
    pub user_id: Option<String>,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub introduction: Option<String>,
    pub git_url: Option<String>,
    pub web_site_url: Option<String>,
    pub group_name: Option<String>,
    pub picture_url: Option<String>,
}

/// 개발자 공개 프로필.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    pub user_id: Option<String>,
    pub email: String,
    pub name: String,
    pub introduction: Option<String>,
    pub git_url: Option<String>,
    pub web_site_url: Option<String>,
    pub group_name: Option<String>,
    pub picture_url: Option<String>,
    pub point: i32,
    pub popularity: i32,
}
