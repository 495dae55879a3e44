
use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use inventory_dashboard as app;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = app::config::load_config().context("failed to load configuration")?;
    app::config::init_tracing(cfg.log_level(), cfg.log_json);

    if !cfg.data_dir.is_dir() {
        warn!(
            data_dir = %cfg.data_dir.display(),
            "data directory does not exist; every table will report as unavailable"
        );
    }

    let state = app::AppState::from_config(cfg.clone());

    if cfg.preload_datasets {
        let datasets = state.dashboard.cache().get().await?;
        info!(
            loaded = datasets.loaded_count(),
            total = app::datasets::TableId::ALL.len(),
            "datasets preloaded"
        );
    }

    let router = app::build_router(state);

    let listener = app::bind_listener(&cfg)
        .await
        .with_context(|| format!("failed to bind {}:{}", cfg.host, cfg.port))?;
    info!(
        "inventory-dashboard listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
