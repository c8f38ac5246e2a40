use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::{AppState, Storage};

/// The chirp HTTP server.
pub struct ChirpServer {
    config: ServerConfig,
}

impl ChirpServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router over `storage` (useful for testing).
    pub fn router(&self, storage: Storage) -> ServerResult<axum::Router> {
        Ok(build_router(AppState::new(&self.config, storage)?))
    }

    /// Open storage, serve until Ctrl-C or SIGTERM, then close storage.
    pub async fn serve(self) -> ServerResult<()> {
        if self.config.uses_development_secret() {
            warn!("using the development secret key; set SECRET_KEY before deploying");
        }

        let storage = Storage::open(&self.config).await?;
        let app = self.router(storage.clone())?;

        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("chirp server listening on {}", self.config.bind_addr);

        let served = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()));

        storage.close().await;
        info!("chirp server stopped");
        served
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
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
                warn!(error = %e, "failed to listen for SIGTERM");
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
