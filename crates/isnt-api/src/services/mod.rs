//! 인증 도메인 서비스.

pub mod auth;
pub mod verification;

pub use auth::{AuthService, LoginOutcome};
pub use verification::{DeveloperLookup, VerificationService};
