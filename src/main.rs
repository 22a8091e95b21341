use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use user_service::config::{load_config, validate_config, AppConfig, ConfigError};
use user_service::lifecycle::{build_server, signals, Shutdown};
use user_service::observability::{init_logging, metrics};

/// JSON user service backed by SQLite.
#[derive(Debug, Parser)]
#[command(name = "user-service", version)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    init_logging(&config.observability)?;

    let worker_threads = config.server.effective_worker_threads();
    let blocking_threads = config.server.effective_blocking_threads();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(blocking_threads)
        .thread_name("user-service")
        .enable_all()
        .build()?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        worker_threads,
        blocking_threads,
        "user-service starting"
    );

    runtime.block_on(run(config))
}

async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        bind_address = %config.server.bind_address,
        database = %config.database.path,
        users_table = %config.database.users_table,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    let server = build_server(config)?;

    let shutdown = Arc::new(Shutdown::new());
    let stop = shutdown.subscribe();
    let signal_shutdown = Arc::clone(&shutdown);
    tokio::spawn(async move {
        if let Err(e) = signals::shutdown_on_signal(&signal_shutdown).await {
            tracing::error!(error = %e, "Failed to listen for termination signals");
        }
    });

    server.run(listener, stop).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
