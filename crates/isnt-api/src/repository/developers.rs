//! PostgreSQL 자격증명 저장소.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use isnt_core::{Developer, NewDeveloper, VerificationCode};
use sqlx::{FromRow, PgPool};

use super::{CredentialStore, StoreError, StoreResult};

// ================================================================================================
// Rows
// ================================================================================================

/// developer 테이블 row
#[derive(Debug, FromRow)]
struct DeveloperRow {
    id: i64,
    user_id: Option<String>,
    email: String,
    password_hash: String,
    name: String,
    introduction: Option<String>,
    git_url: Option<String>,
    web_site_url: Option<String>,
    group_name: Option<String>,
    picture_url: Option<String>,
    point: i32,
    popularity: i32,
    auth_num: Option<i64>,
    auth_num_issued_at: Option<DateTime<Utc>>,
    auth_num_consumed: bool,
}

impl TryFrom<DeveloperRow> for Developer {
    type Error = StoreError;

    fn try_from(row: DeveloperRow) -> Result<Self, Self::Error> {
        let verification = to_code(row.auth_num, row.auth_num_issued_at, row.auth_num_consumed)?;

        Ok(Developer {
            id: row.id,
            user_id: row.user_id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            introduction: row.introduction,
            git_url: row.git_url,
            web_site_url: row.web_site_url,
            group_name: row.group_name,
            picture_url: row.picture_url,
            point: row.point,
            popularity: row.popularity,
            verification,
        })
    }
}

/// signup_verification 테이블 row
#[derive(Debug, FromRow)]
struct SignUpCodeRow {
    auth_num: i64,
    issued_at: DateTime<Utc>,
    consumed: bool,
}

fn to_code(
    value: Option<i64>,
    issued_at: Option<DateTime<Utc>>,
    consumed: bool,
) -> StoreResult<Option<VerificationCode>> {
    match (value, issued_at) {
        (Some(value), Some(issued_at)) => {
            let value = u32::try_from(value)
                .map_err(|_| StoreError::Corrupted(format!("auth_num {}", value)))?;
            Ok(Some(VerificationCode {
                value,
                issued_at,
                consumed,
            }))
        }
        _ => Ok(None),
    }
}

/// 유니크 제약 위반을 `Duplicate`로 분류.
fn classify(err: sqlx::Error, developer: &NewDeveloper) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some(c) if c.contains("email") => StoreError::Duplicate {
                    field: "email",
                    value: developer.email.clone(),
                },
                _ => StoreError::Duplicate {
                    field: "user_id",
                    value: developer.user_id.clone().unwrap_or_default(),
                },
            };
        }
    }
    StoreError::Database(err)
}

const DEVELOPER_COLUMNS: &str = r#"
    id, user_id, email, password_hash, name,
    introduction, git_url, web_site_url, group_name, picture_url,
    point, popularity, auth_num, auth_num_issued_at, auth_num_consumed
"#;

// ================================================================================================
// Store
// ================================================================================================

/// PostgreSQL 기반 [`CredentialStore`].
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<Developer>> {
        let query = format!(
            "SELECT {} FROM developer WHERE {} = $1 LIMIT 1",
            DEVELOPER_COLUMNS, column
        );

        sqlx::query_as::<_, DeveloperRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .map(Developer::try_from)
            .transpose()
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<Developer>> {
        self.find_one("user_id", user_id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Developer>> {
        // 빈 이메일은 외부 인증 계정끼리 공유하므로 조회 키가 될 수 없음
        if email.trim().is_empty() {
            return Ok(None);
        }
        self.find_one("email", email).await
    }

    async fn create(&self, developer: NewDeveloper) -> StoreResult<Developer> {
        let query = format!(
            r#"
            INSERT INTO developer (
                user_id, email, password_hash, name,
                introduction, git_url, web_site_url, group_name, picture_url
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            DEVELOPER_COLUMNS
        );

        let row = sqlx::query_as::<_, DeveloperRow>(&query)
            .bind(&developer.user_id)
            .bind(&developer.email)
            .bind(&developer.password_hash)
            .bind(&developer.name)
            .bind(&developer.introduction)
            .bind(&developer.git_url)
            .bind(&developer.web_site_url)
            .bind(&developer.group_name)
            .bind(&developer.picture_url)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| classify(e, &developer))?;

        Developer::try_from(row)
    }

    async fn set_code(&self, id: i64, code: &VerificationCode) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE developer SET
                auth_num = $2,
                auth_num_issued_at = $3,
                auth_num_consumed = $4,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(i64::from(code.value))
        .bind(code.issued_at)
        .bind(code.consumed)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(id));
        }
        Ok(())
    }

    async fn consume_code_and_set_password(
        &self,
        id: i64,
        auth_num: u32,
        now: DateTime<Utc>,
        ttl: Duration,
        password_hash: &str,
    ) -> StoreResult<bool> {
        // 단일 UPDATE의 행 잠금으로 동시 요청 중 하나만 조건을 만족함
        let result = sqlx::query(
            r#"
            UPDATE developer SET
                password_hash = $3,
                auth_num_consumed = TRUE,
                updated_at = NOW()
            WHERE id = $1
              AND auth_num = $2
              AND NOT auth_num_consumed
              AND auth_num_issued_at >= $4
            "#,
        )
        .bind(id)
        .bind(i64::from(auth_num))
        .bind(password_hash)
        .bind(now - ttl)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn save_sign_up_code(&self, email: &str, code: &VerificationCode) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO signup_verification (email, auth_num, issued_at, consumed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO UPDATE SET
                auth_num = EXCLUDED.auth_num,
                issued_at = EXCLUDED.issued_at,
                consumed = EXCLUDED.consumed
            "#,
        )
        .bind(email)
        .bind(i64::from(code.value))
        .bind(code.issued_at)
        .bind(code.consumed)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_sign_up_code(&self, email: &str) -> StoreResult<Option<VerificationCode>> {
        let row = sqlx::query_as::<_, SignUpCodeRow>(
            "SELECT auth_num, issued_at, consumed FROM signup_verification WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => to_code(Some(row.auth_num), Some(row.issued_at), row.consumed),
            None => Ok(None),
        }
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn name(&self) -> &str {
        "postgres"
    }
}
