//! Environment loading and service wiring.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use rudder_api::{ApiState, build_router};
use rudder_client::TorrentClient;
use rudder_events::EventBus;
use rudder_proto::{Transport, unconnected};
use rudder_services::registry::{ServiceDeps, ServiceRegistry};
use rudder_telemetry::LoggingConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{AppError, AppResult};

const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);
const DEFAULT_HTTP_PORT: u16 = 3000;
const DEFAULT_DATA_DIR: &str = "./data";

/// Application configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the API listener binds to (`RUDDER_BIND_ADDR`).
    pub bind_addr: IpAddr,
    /// Port the API listener binds to (`RUDDER_HTTP_PORT`).
    pub http_port: u16,
    /// Root directory for persisted per-user state (`RUDDER_DATA_DIR`).
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Read configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error when a variable is present but unparseable.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(&|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> AppResult<Self> {
        let bind_addr = match lookup("RUDDER_BIND_ADDR") {
            Some(raw) => raw.parse().map_err(|_| AppError::InvalidEnv {
                name: "RUDDER_BIND_ADDR",
                value: raw,
            })?,
            None => DEFAULT_BIND_ADDR,
        };
        let http_port = match lookup("RUDDER_HTTP_PORT") {
            Some(raw) => raw.parse().map_err(|_| AppError::InvalidEnv {
                name: "RUDDER_HTTP_PORT",
                value: raw,
            })?,
            None => DEFAULT_HTTP_PORT,
        };
        let data_dir = lookup("RUDDER_DATA_DIR")
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        Ok(Self {
            bind_addr,
            http_port,
            data_dir,
        })
    }

    /// Socket address the API listener binds to.
    #[must_use]
    pub const fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.http_port)
    }
}

/// Entry point for the application boot sequence.
///
/// Boots without a daemon bridge: every daemon-backed endpoint answers 503
/// until a transport is wired in through [`run_app_with`] by an embedder.
///
/// # Errors
///
/// Returns an error if configuration loading or application startup fails.
pub async fn run_app() -> AppResult<()> {
    let config = AppConfig::from_env()?;
    run_app_with(config, unconnected()).await
}

/// Boot sequence over injected dependencies.
///
/// # Errors
///
/// Returns an error if telemetry initialisation, listener binding, or
/// serving fails.
pub async fn run_app_with(config: AppConfig, transport: Arc<dyn Transport>) -> AppResult<()> {
    rudder_telemetry::init_logging(&LoggingConfig::default())
        .map_err(|source| AppError::Telemetry { source })?;

    info!("rudder application bootstrap starting");

    let events = EventBus::new();
    let registry = Arc::new(ServiceRegistry::new(ServiceDeps {
        transport,
        events,
        data_dir: config.data_dir.clone(),
    }));
    let client = TorrentClient::new(registry);
    let router = build_router(Arc::new(ApiState::new(client)));

    let addr = config.listen_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind { addr, source })?;
    info!(%addr, "api listener bound");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|source| AppError::Serve { source })?;

    info!("api server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
