//! `soar-server` binary: wires the alert-processing pipeline into a runnable
//! process -- webhook ingestion, admin operations, the read API, and
//! metrics, backed by the in-process task queue and in-memory case store.

use std::sync::Arc;

use clap::Parser;
use tracing::info;

use soar_action::ActionExecutor;
use soar_blocklist::BlocklistStore;
use soar_playbook::Orchestrator;
use soar_queue::{QueueConfig, TaskQueue};
use soar_server::handler::PipelineHandler;
use soar_server::{router, AppState, Config};
use soar_state::{CaseStore, InMemoryCaseStore};

/// Overrides applied on top of the environment-derived [`Config`]: a thin CLI
/// layer over an otherwise env-driven configuration.
#[derive(Parser, Debug)]
#[command(name = "soar-server", about = "SOAR alert-processing pipeline server")]
struct Cli {
    /// Override the bind address (otherwise `SOAR_BIND_ADDR`, default `0.0.0.0:8080`).
    #[arg(long)]
    bind_addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }
    let config = Arc::new(config);

    let metrics_handle = soar_server::metrics::install()?;

    let store: Arc<dyn CaseStore> = Arc::new(InMemoryCaseStore::new());
    let blocklist = Arc::new(BlocklistStore::new(config.blocklist_path.clone()));
    let http = reqwest::Client::new();

    let queue_config = QueueConfig {
        workers: config.queue_workers,
        max_retries: config.queue_max_retries,
        retry_backoff: config.queue_retry_backoff,
    };

    let queue = TaskQueue::spawn_cyclic(queue_config, |queue| {
        let orchestrator = Arc::new(Orchestrator::new(
            Arc::clone(&store),
            http.clone(),
            queue,
            config.bad_domains_path.clone(),
            config.bad_ips_path.clone(),
        ));
        let action_executor = Arc::new(ActionExecutor::new(Arc::clone(&store), Arc::clone(&blocklist)));
        Arc::new(PipelineHandler::new(orchestrator, action_executor)) as Arc<dyn soar_queue::TaskHandler>
    });

    let state = AppState { store, queue, config: Arc::clone(&config), metrics_handle };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(address = %config.bind_addr, "soar-server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("soar-server shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl+C) or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
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
