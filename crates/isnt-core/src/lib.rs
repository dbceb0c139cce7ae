//! # Isnt Core
//!
//! 개발자 Q&A 플랫폼 백엔드의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 API 서버와 알림 크레이트에서 공통으로 사용하는 타입을 제공합니다:
//! - 개발자(Developer) 계정 및 공개 프로필
//! - 인증번호(VerificationCode) 상태 머신
//! - 인증 도메인 에러
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
