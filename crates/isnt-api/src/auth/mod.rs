//! 인증 모듈.
//!
//! - [`jwt`]: Access Token 발급/검증
//! - [`password`]: 비밀번호 해싱
//! - [`filter`]: 요청별 인증 필터와 추출기
//! - [`policy`]: 경로별 접근 정책

pub mod filter;
pub mod jwt;
pub mod password;
pub mod policy;

pub use filter::{auth_pipeline, authenticate, AuthContext, Authenticated};
pub use jwt::{AccessToken, Claims, TokenProvider};
pub use password::{PasswordError, PasswordHasher};
pub use policy::{AccessPolicy, Capability, PolicyError};
