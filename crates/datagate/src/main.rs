//! Datagate - open-data query gateway for the municipal portal.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use datagate::build_router;
use datagate_core::logging::{init_logging, LogConfig};
use datagate_core::{ConnectionPool, GatewayConfig, GatewayState, UploadStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly
    let dotenv = dotenvy::dotenv();

    let config = GatewayConfig::from_env().context("invalid configuration")?;
    let _logging_guard = init_logging(LogConfig::new(config.log_dir.clone()));

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }
    tracing::info!(
        db = %config.connection.display_url(),
        schema = %config.connection.schema,
        upload_dir = %config.upload_dir.display(),
        "Starting Datagate"
    );

    let pool = ConnectionPool::new(config.connection.clone(), &config.password)
        .await
        .context("failed to connect to the database")?;

    let uploads = UploadStore::new(&config.upload_dir, config.max_upload_bytes);
    uploads.init().await.context("failed to prepare the upload directory")?;

    let state = GatewayState::new(Arc::new(pool), config.connection.schema.clone(), uploads);
    let app = build_router(state.clone());

    let listener = TcpListener::bind(config.listen_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr()))?;
    tracing::info!(addr = %config.listen_addr(), "Datagate listening");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .context("server failed")?;

    state.shutdown();
    tracing::info!("Datagate stopped");
    Ok(())
}

/// Cancel `token` on SIGINT or SIGTERM.
async fn watch_signals(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = tokio::signal::ctrl_c() => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot watch SIGTERM; only ctrl-c stops the server");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    tracing::info!("Shutdown requested; draining in-flight requests");
    token.cancel();
}
