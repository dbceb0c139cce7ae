//! Access Token 발급 및 검증.
//!
//! 토큰은 subject(userId)와 만료 시각만 담으며 서버에 저장되지 않습니다.
//! 유효성은 검증 시점의 서명과 만료 시각만으로 결정됩니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use isnt_core::{AuthConfig, AuthError, AuthResult};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Access Token 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 개발자 userId
    pub sub: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
}

/// 발급된 Access Token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    /// 인코딩된 JWT 문자열
    pub token: String,
    /// 만료 시각
    pub expires_at: DateTime<Utc>,
}

/// JWT 기반 Token Provider.
///
/// 서명 키와 유효 시간은 시작 시 설정에서 한 번 읽어 보관합니다.
pub struct TokenProvider {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenProvider {
    /// 인증 설정으로 Token Provider 생성.
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: Duration::minutes(config.access_token_ttl_minutes),
        }
    }

    /// 토큰 유효 시간.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 현재 시각 기준으로 토큰 발급.
    pub fn issue(&self, subject: &str) -> AuthResult<AccessToken> {
        self.issue_at(subject, Utc::now())
    }

    /// 지정한 발급 시각 기준으로 토큰 발급 (만료 시각 = 발급 시각 + TTL).
    pub fn issue_at(&self, subject: &str, issued_at: DateTime<Utc>) -> AuthResult<AccessToken> {
        let expires_at = issued_at + self.ttl;
        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("토큰 인코딩 실패: {}", e)))?;

        Ok(AccessToken { token, expires_at })
    }

    /// 토큰을 검증하고 Claims 반환.
    ///
    /// 만료는 `TokenExpired`, 그 외 모든 실패(서명 불일치, 형식 오류 등)는
    /// `TokenInvalid`로 분류됩니다.
    pub fn decode(&self, token: &str) -> AuthResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })
    }

    /// 토큰을 검증하고 subject(userId) 반환.
    pub fn validate(&self, token: &str) -> AuthResult<String> {
        let claims = self.decode(token)?;
        if claims.sub.is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        Ok(claims.sub)
    }

    /// 토큰의 만료 시각.
    pub fn expires_at(claims: &Claims) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(claims.exp, 0).single()
    }
}
