//! isnt API 서버 진입점.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::Router;
use isnt_api::{create_router, AppState, CredentialStore, InMemoryCredentialStore, PgCredentialStore, MIGRATOR};
use isnt_core::{init_logging, AppConfig, DatabaseConfig, MailConfig, ServerConfig};
use isnt_notification::{LogMailer, MailDispatcher, SmtpMailer};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer, ExposeHeaders};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (있는 경우)
    let _ = dotenvy::dotenv();

    let config = AppConfig::load_default().context("설정 로드 실패")?;
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    info!("Starting isnt API server...");

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("잘못된 서버 주소")?;

    let store = connect_store(&config.database).await?;
    let mailer = create_mailer(&config.mail)?;
    info!(
        credential_store = store.name(),
        mailer = mailer.name(),
        "Service connections status"
    );

    let cors = cors_layer(&config.server, &config.auth.token_header);
    let state = Arc::new(AppState::new(config, store, mailer)?);
    let app = build_app(state, cors);

    info!(%addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped gracefully");
    Ok(())
}

/// 자격증명 저장소 연결.
///
/// 데이터베이스 URL이 없으면 메모리 저장소로 시작합니다.
async fn connect_store(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn CredentialStore>> {
    let Some(url) = config.url.as_deref() else {
        warn!("Database URL not set, using in-memory credential store (data is not persisted)");
        return Ok(Arc::new(InMemoryCredentialStore::new()));
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
        .connect(url)
        .await
        .context("데이터베이스 연결 실패")?;

    if config.run_migrations {
        MIGRATOR.run(&pool).await.context("마이그레이션 실패")?;
        info!("Database migrations applied");
    }

    info!("Connected to PostgreSQL successfully");
    Ok(Arc::new(PgCredentialStore::new(pool)))
}

/// 메일 발송 채널 생성.
fn create_mailer(config: &MailConfig) -> anyhow::Result<Arc<dyn MailDispatcher>> {
    if !config.enabled {
        warn!("Mail disabled, verification codes will only be logged as sent");
        return Ok(Arc::new(LogMailer));
    }

    let mailer = SmtpMailer::from_config(config).context("SMTP 설정 실패")?;
    info!(host = %config.smtp_host, port = config.smtp_port, "SMTP mailer configured");
    Ok(Arc::new(mailer))
}

/// CORS 레이어 생성.
///
/// 허용 origin이 설정되지 않으면 개발 모드로 간주하여 모든 origin을 허용합니다.
/// 로그인 응답의 토큰 헤더는 브라우저에서 읽을 수 있도록 노출합니다.
fn cors_layer(config: &ServerConfig, token_header: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let allow_origin = if origins.is_empty() {
        warn!("CORS origins not set, allowing any origin (development mode)");
        AllowOrigin::any()
    } else {
        info!("CORS configured with {} allowed origins", origins.len());
        AllowOrigin::list(origins)
    };

    let mut headers = vec![axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION];
    if let Ok(name) = HeaderName::from_bytes(token_header.as_bytes()) {
        if !headers.contains(&name) {
            headers.push(name);
        }
    }

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::list(headers.clone()))
        .expose_headers(ExposeHeaders::list(headers))
}

fn build_app(state: Arc<AppState>, cors: CorsLayer) -> Router {
    create_router(state)
        .layer(TraceLayer::new_for_http())
        // 전역 타임아웃 (30초) - 408 상태 코드 반환
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(30)))
        .layer(cors)
}

/// Graceful shutdown 시그널 대기 (Ctrl+C 또는 SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            warn!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            warn!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
