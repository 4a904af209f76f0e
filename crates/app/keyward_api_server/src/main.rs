//! Keyward login API server binary.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use keyward_api::config::ApiConfig;
use keyward_api::services::captcha::{CaptchaVerifier, DisabledCaptcha, ReCaptchaVerifier};
use keyward_core::auth::login::LoginEngine;
use keyward_core::auth::queries::PgCredentialStore;
use keyward_core::billing::alert::TracingAlertSink;
use keyward_core::billing::queries::PgBillingProvider;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server. Anything not given here falls back to
/// the environment (see `ApiConfig::from_env`).
#[derive(Parser, Debug)]
#[command(name = "keyward_api_server", about = "Keyward login API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:4000")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/keyward"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Skip running embedded migrations on startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,keyward_api=debug,keyward_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let config = ApiConfig {
        bind_addr: args.bind_addr,
        pg_connection_url: args.database_url,
        ..ApiConfig::from_env()
    };

    info!(
        bind_addr = %config.bind_addr,
        api_domain = %config.api_domain,
        billing_enabled = config.billing_enabled,
        captcha_enabled = config.recaptcha_secret.is_some(),
        "starting keyward_api_server"
    );
    if config.jwt_secret.is_empty() {
        warn!("JWT_SECRET is not set; every login will fail to issue a token");
    }

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.pg_connection_url)
        .await?;

    if !args.skip_migrations {
        info!("running database migrations");
        keyward_core::migrate::migrate(&pool).await?;
    }

    let captcha: Arc<dyn CaptchaVerifier> = match &config.recaptcha_secret {
        Some(secret) => Arc::new(ReCaptchaVerifier::new(reqwest_client()?, secret.clone())),
        None => Arc::new(DisabledCaptcha),
    };

    let engine = LoginEngine::new(
        config.auth_config(),
        Arc::new(PgCredentialStore::new(pool.clone())),
        Arc::new(PgBillingProvider::new(pool)),
        Arc::new(TracingAlertSink),
    );

    let state = keyward_api::AppState {
        engine: Arc::new(engine),
        captcha,
    };

    let app = keyward_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

/// HTTP client for outbound captcha checks.
fn reqwest_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
}
