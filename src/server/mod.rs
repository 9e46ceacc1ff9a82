//! HTTP service layer
//!
//! Exposes the catalog and the install workflow over a small REST surface.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/stable-versions` | Stable versions that may be offered for the running version |
//! | GET | `/sync` | Refresh the catalog now |
//! | GET | `/last-updated` | Timestamp of the last catalog refresh |
//! | GET | `/download?version=X` | Pull and apply a stable version |
//!
//! # Modules
//!
//! - [`handlers`]: axum route handlers
//! - [`refresh`]: Background refresh of a stale catalog

pub mod handlers;
pub mod refresh;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tracing::{error, info};

use crate::config::Config;
use crate::release::catalog::VersionCatalog;
use crate::release::gateway::Gateway;
use crate::release::gateways::HttpGateway;
use crate::release::installer::InstallOrchestrator;
use crate::release::store::FileStore;

/// Shared state for route handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<VersionCatalog<FileStore>>,
    pub installer: Arc<InstallOrchestrator<FileStore>>,
    pub gateway: Arc<dyn Gateway>,
}

impl AppState {
    /// Wire the catalog and the installer around a gateway, persisting under `config.data_dir`
    pub fn new(config: &Config, gateway: Arc<dyn Gateway>) -> Self {
        let store = Arc::new(FileStore::new(
            &config.stables_path(),
            &config.last_updated_path(),
        ));
        let catalog = Arc::new(VersionCatalog::new(
            store,
            gateway.clone(),
            config.catalog_source,
            &config.repository,
        ));
        let installer = Arc::new(InstallOrchestrator::new(
            catalog.clone(),
            gateway.clone(),
            &config.repository,
            config.install.clone(),
        ));

        Self {
            catalog,
            installer,
            gateway,
        }
    }
}

/// Build the service router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/stable-versions", get(handlers::stable_versions))
        .route("/sync", get(handlers::sync))
        .route("/last-updated", get(handlers::last_updated))
        .route("/download", get(handlers::download))
        .with_state(state)
}

/// Run the service until Ctrl-C
pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let gateway: Arc<dyn Gateway> =
        Arc::new(HttpGateway::new(&config).context("failed to create HTTP client")?);
    let state = AppState::new(&config, gateway);

    let refresh_handle = refresh::spawn_background_refresh(state.catalog.clone(), &config.cache);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(%addr, blueos = %config.blueos_url, "Stabler listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await?;

    refresh_handle.abort();
    info!("Stabler stopped");
    Ok(())
}
