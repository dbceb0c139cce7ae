//! 경로별 접근 정책.
//!
//! `(method, path pattern) -> Capability` 테이블을 요청마다 한 번 평가합니다.
//! 규칙은 선언 순서대로 검사하며 처음 일치한 규칙이 적용되고,
//! 일치하는 규칙이 없으면 기본값(`Authenticated`)을 요구합니다.
//!
//! `Ignored` 경로는 인증 필터 자체를 건너뛰므로 만료되거나 잘못된 토큰 헤더가
//! 있어도 요청이 핸들러까지 전달됩니다.

use axum::http::Method;
use isnt_core::{AuthError, AuthResult};

use super::filter::AuthContext;

/// 경로 접근에 필요한 권한.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// 인증 필터 미적용 (토큰 헤더를 읽지 않음)
    Ignored,
    /// 토큰 없이 접근 가능 (헤더가 있으면 검증)
    Public,
    /// 유효한 Access Token 필요
    Authenticated,
}

impl Capability {
    /// 인증 컨텍스트가 요구 권한을 충족하는지 확인.
    ///
    /// # Errors
    ///
    /// `Authenticated` 경로에 토큰이 없으면 `AuthError::Unauthenticated`.
    pub fn check(self, context: &AuthContext) -> AuthResult<()> {
        match (self, context) {
            (Capability::Ignored | Capability::Public, _) => Ok(()),
            (Capability::Authenticated, AuthContext::Authenticated { .. }) => Ok(()),
            (Capability::Authenticated, AuthContext::Anonymous) => Err(AuthError::Unauthenticated),
        }
    }
}

/// 규칙 파싱 에러.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("잘못된 접근 규칙 형식: {0} (예: \"GET /api/**\")")]
    InvalidRule(String),
    #[error("잘못된 HTTP 메서드: {0}")]
    InvalidMethod(String),
}

/// 경로 패턴.
///
/// `*`는 한 세그먼트, `**`는 0개 이상의 세그먼트와 일치합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PathPattern {
    segments: Vec<String>,
}

impl PathPattern {
    fn parse(pattern: &str) -> Self {
        Self {
            segments: split_path(pattern).map(str::to_string).collect(),
        }
    }

    fn matches(&self, path: &str) -> bool {
        let path: Vec<&str> = split_path(path).collect();
        match_segments(&self.segments, &path)
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// 세그먼트 단위 glob 매칭.
///
/// 마지막 `**` 위치만 기억하고 되돌아가므로 `O(pattern * path)`에 끝납니다.
fn match_segments(pattern: &[String], path: &[&str]) -> bool {
    let (mut p, mut s) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while s < path.len() {
        match pattern.get(p).map(String::as_str) {
            Some("**") => {
                backtrack = Some((p, s));
                p += 1;
            }
            Some(head) if head == "*" || head == path[s] => {
                p += 1;
                s += 1;
            }
            _ => match backtrack {
                Some((star, consumed)) => {
                    p = star + 1;
                    s = consumed + 1;
                    backtrack = Some((star, consumed + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|segment| segment == "**")
}

/// 접근 규칙 하나.
#[derive(Debug, Clone)]
struct AccessRule {
    /// `None`이면 모든 메서드
    method: Option<Method>,
    pattern: PathPattern,
    capability: Capability,
}

impl AccessRule {
    fn applies(&self, method: &Method, path: &str) -> bool {
        self.method.as_ref().map_or(true, |m| m == method) && self.pattern.matches(path)
    }
}

/// 경로별 접근 정책 테이블.
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    rules: Vec<AccessRule>,
    default: Capability,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            default: Capability::Authenticated,
        }
    }
}

impl AccessPolicy {
    /// `"METHOD /pattern"` 형식의 필터 제외 경로와 공개 경로로 정책 생성.
    ///
    /// 필터 제외 규칙이 공개 규칙보다 먼저 평가됩니다.
    pub fn from_rules<S: AsRef<str>>(ignored: &[S], public: &[S]) -> Result<Self, PolicyError> {
        let mut rules = ignored
            .iter()
            .map(|rule| (rule, Capability::Ignored))
            .chain(public.iter().map(|rule| (rule, Capability::Public)));

        rules.try_fold(Self::default(), |policy, (rule, capability)| {
            let (method, pattern) = parse_rule(rule.as_ref())?;
            Ok(policy.with_rule(method, pattern, capability))
        })
    }

    /// 규칙 추가 (기존 규칙 뒤에 평가됨).
    pub fn with_rule(mut self, method: Option<Method>, pattern: &str, capability: Capability) -> Self {
        self.rules.push(AccessRule {
            method,
            pattern: PathPattern::parse(pattern),
            capability,
        });
        self
    }

    /// 요청에 필요한 권한.
    pub fn required(&self, method: &Method, path: &str) -> Capability {
        self.rules
            .iter()
            .find(|rule| rule.applies(method, path))
            .map_or(self.default, |rule| rule.capability)
    }
}

fn parse_rule(rule: &str) -> Result<(Option<Method>, &str), PolicyError> {
    let (method, pattern) = rule
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| PolicyError::InvalidRule(rule.to_string()))?;

    let method = match method {
        "*" => None,
        m => Some(
            Method::from_bytes(m.to_uppercase().as_bytes())
                .map_err(|_| PolicyError::InvalidMethod(m.to_string()))?,
        ),
    };
    Ok((method, pattern.trim()))
}
