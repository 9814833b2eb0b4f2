use clap::{Parser, Subcommand};
use hivemind::api::{create_router, AppState};
use hivemind::config::AppConfig;
use hivemind::engine::{ticker, SessionController};
use hivemind::error::Result;
use hivemind::oracles::OracleHub;
use hivemind::queue::{HttpOrderQueue, NullOrderQueue, OrderQueue};
use hivemind::store::PostgresStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hivemind", about = "Hive session trading orchestrator", version)]
struct Cli {
    /// Configuration directory
    #[arg(long, default_value = "config")]
    config_dir: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the orchestrator (default)
    Serve,
    /// Apply database migrations and exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load_from(&cli.config_dir)?;
    init_logging(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Migrate => {
            let store =
                PostgresStore::new(&config.database.url, config.database.max_connections).await?;
            store.migrate().await?;
        }
        Commands::Serve => {
            serve(config).await?;
        }
    }
    Ok(())
}

async fn serve(config: AppConfig) -> Result<()> {
    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("config: {e}");
        }
        return Err(hivemind::HivemindError::Internal(
            "invalid configuration".to_string(),
        ));
    }

    let store = Arc::new(
        PostgresStore::new(&config.database.url, config.database.max_connections).await?,
    );
    store.migrate().await?;

    let oracles = OracleHub::simulated(
        config.oracle.seed,
        Duration::from_millis(config.oracle.timeout_ms),
    );

    let queue: Arc<dyn OrderQueue> = if config.queue.url.trim().is_empty() {
        warn!("no queue url configured, orders will be accepted in dry-run mode");
        Arc::new(NullOrderQueue)
    } else {
        Arc::new(HttpOrderQueue::new(
            config.queue.url.clone(),
            Duration::from_millis(config.queue.timeout_ms),
        )?)
    };

    let controller = SessionController::new(store, oracles, queue);

    if config.trading.auto_step_secs > 0 {
        let ticker_controller = controller.clone();
        let interval = Duration::from_secs(config.trading.auto_step_secs);
        tokio::spawn(async move {
            ticker::run(ticker_controller, interval).await;
        });
    }

    let state = AppState::new(controller, config.server.api_token.clone());
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(bind = %config.server.bind, "API server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

fn init_logging(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{},sqlx=warn", config.logging.level))
    });

    if config.logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
