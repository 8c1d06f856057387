use std::future::IntoFuture;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use cirrus_server::api::{AppState, router};
use cirrus_server::config::CirrusConfig;
use cirrus_server::store_factory::{connection_from_env, create_store};

/// Port variable set by the Functions host for custom handlers.
const CUSTOM_HANDLER_PORT_ENV: &str = "FUNCTIONS_CUSTOMHANDLER_PORT";

/// Cirrus function app custom-handler server.
#[derive(Parser, Debug)]
#[command(name = "cirrus-server", about = "Custom-handler server for the Cirrus function app")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "cirrus.toml")]
    config: PathBuf,

    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a local CSV file the way the upload function does and print
    /// each record, then exit.
    Ingest {
        /// CSV file to read.
        file: PathBuf,

        /// Read size in bytes.
        #[arg(long, default_value_t = 8192)]
        chunk_size: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = CirrusConfig::load(&cli.config)?;
    cirrus_server::telemetry::init(&config.telemetry);

    if !cli.config.exists() {
        info!(path = %cli.config.display(), "config file not found, using defaults");
    }

    if let Some(Commands::Ingest { file, chunk_size }) = cli.command {
        return run_ingest(&file, chunk_size).await;
    }

    let connection = connection_from_env(&config.storage);
    let store = create_store(&config.storage, connection.as_deref())?;

    let state = AppState::new(
        store,
        config.metadata_log.to_append_config(),
        config.triggers,
    );
    let app = router(state);

    // Resolve the bind address (CLI overrides the host's port variable,
    // which overrides the file).
    let host = cli.host.unwrap_or(config.server.host);
    let port = match cli.port {
        Some(port) => port,
        None => custom_handler_port()?.unwrap_or(config.server.port),
    };
    let addr = format!("{host}:{port}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "cirrus-server listening");

    // Serve with graceful shutdown on SIGINT / SIGTERM, bounded by the
    // configured drain timeout.
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_seconds);
    let (drain_tx, drain_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = drain_tx.send(());
        })
        .into_future();

    tokio::select! {
        result = server => result?,
        () = async {
            let _ = drain_rx.await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(
                timeout_secs = config.server.shutdown_timeout_seconds,
                "shutdown timeout exceeded, abandoning in-flight invocations"
            );
        }
    }

    info!("cirrus-server shut down");
    Ok(())
}

fn custom_handler_port() -> Result<Option<u16>, Box<dyn std::error::Error>> {
    match std::env::var(CUSTOM_HANDLER_PORT_ENV) {
        Ok(raw) if !raw.trim().is_empty() => {
            let port = raw
                .trim()
                .parse()
                .map_err(|e| format!("invalid {CUSTOM_HANDLER_PORT_ENV} '{raw}': {e}"))?;
            Ok(Some(port))
        }
        _ => Ok(None),
    }
}

/// Run the `ingest` subcommand: stream a local file through the CSV parser
/// and print one line per record.
async fn run_ingest(file: &Path, chunk_size: usize) -> Result<(), Box<dyn std::error::Error>> {
    let reader = tokio::fs::File::open(file).await?;
    let mut stdout = std::io::stdout();
    let count = cirrus_server::ingest::print_records(reader, chunk_size, &mut stdout).await?;

    info!(file = %file.display(), records = count, "ingest complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("received SIGINT"); }
        () = terminate => { info!("received SIGTERM"); }
    }
}
