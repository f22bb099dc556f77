// Main entry point for the gatekeeper service

use anyhow::Context;
use axum::Router;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use gatekeeper::api::{create_router, AppState};
use gatekeeper::audit::InMemoryAuditStore;
use gatekeeper::auth::api_key::ApiKeyCipher;
use gatekeeper::auth::token::TokenCodec;
use gatekeeper::config::Config;
use gatekeeper::core::models::{SessionClaims, SubjectStatus, SubjectType};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,

    /// Print a new API key for an application
    CreateApiKey {
        /// Application name embedded in the key
        #[arg(long)]
        app: String,
    },

    /// Print a signed session token
    IssueToken {
        #[arg(long)]
        subject: String,

        /// SYSADMIN, SUPPORT, USER or SERVICE
        #[arg(long, default_value = "USER")]
        subject_type: SubjectType,

        /// PENDING, ACTIVE, BLOCKED or SUSPENDED
        #[arg(long, default_value = "ACTIVE")]
        status: SubjectStatus,

        /// Lifetime in minutes; 0 issues a non-expiring credential
        #[arg(long, default_value_t = 30)]
        ttl_minutes: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load and validate configuration first (before any logging)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateApiKey { app } => {
            let cipher = ApiKeyCipher::new(config.api_key_secret.clone());
            println!("{}", cipher.create_api_key(&app)?);
            Ok(())
        }
        Command::IssueToken {
            subject,
            subject_type,
            status,
            ttl_minutes,
        } => {
            let expires_at = if ttl_minutes == 0 {
                0
            } else {
                Utc::now().timestamp_millis() + ttl_minutes * 60 * 1000
            };
            let codec = TokenCodec::new(config.token_signing_key.clone());
            let claims = SessionClaims::new(subject, subject_type, status, expires_at);
            println!("{}", codec.issue(&claims)?);
            Ok(())
        }
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // Must be done only once - tracing panics if init() is called multiple times
    init_tracing(&config);

    info!(
        bind_address = %config.bind_address,
        port = config.port,
        api_version = %config.api_version,
        "Configuration loaded"
    );

    let addr = format!("{}:{}", config.bind_address, config.port);
    let app_state = AppState::new(config, Arc::new(InMemoryAuditStore::new()))?;
    info!(version = %app_state.version, "Route gate initialized");

    let router = create_router(app_state, Router::new());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| {
            error!(error = %e, addr = %addr, "Failed to bind to address");
            e
        })
        .with_context(|| format!("binding {}", addr))?;

    info!(addr = %addr, "Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
fn init_tracing(config: &Config) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
