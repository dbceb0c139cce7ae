//! 도메인 모델.

mod developer;
mod verification;

pub use developer::{Developer, NewDeveloper, PublicProfile};
pub use verification::{CodeState, VerificationCode, CODE_MAX, CODE_MIN};
