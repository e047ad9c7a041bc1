//! Jukeq API service - main entry point
//!
//! Collaborative music-queue server: song submission, voting, playlist
//! ranking, playback sequencing, and SSE fan-out, backed by SQLite.

use anyhow::{Context, Result};
use clap::Parser;
use jukeq_api::api::{create_router, AppContext};
use jukeq_api::resolver::OEmbedResolver;
use jukeq_api::sse::EventBus;
use jukeq_common::config::Config;
use jukeq_common::db::init_database;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for jukeq-api
#[derive(Parser, Debug)]
#[command(name = "jukeq-api")]
#[command(about = "Collaborative music-queue server")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "JUKEQ_CONFIG")]
    config: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "JUKEQ_PORT")]
    port: Option<u16>,

    /// Database file path (overrides config)
    #[arg(short, long, env = "JUKEQ_DB")]
    database: Option<PathBuf>,

    /// Admin bearer token (overrides config)
    #[arg(long, env = "JUKEQ_ADMIN_TOKEN")]
    admin_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jukeq_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    // Priority: CLI/env > config file > compiled default
    let mut config = Config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(database) = args.database {
        config.database.path = database.to_string_lossy().to_string();
    }
    if let Some(token) = args.admin_token {
        config.server.admin_token = Some(token);
    }

    info!("Starting jukeq-api on port {}", config.server.port);
    if config.admission.open_hour == config.admission.close_hour {
        info!("Session admission window: always open");
    } else {
        info!(
            "Session admission window: {:02}:00-{:02}:00",
            config.admission.open_hour, config.admission.close_hour
        );
    }

    let db = init_database(&PathBuf::from(&config.database.path))
        .await
        .context("Failed to initialize database")?;

    let events = EventBus::new(100);
    let resolver = Arc::new(
        OEmbedResolver::new(Duration::from_millis(config.resolver.timeout_ms))
            .context("Failed to build video resolver")?,
    );

    let ctx = AppContext::new(db, events, &config, resolver);
    let app = create_router(ctx);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Starting HTTP server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
