//! Observer listener and serving.
//!
//! Binding and serving are split. The engine calls [`bind`] before the first
//! episode so a bad host or a taken port fails at startup, then hands the
//! listener to [`serve`] on a background task.

use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use std::sync::Arc;

use crisis_core::config::ObserverConfig;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Where the observer listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host address, e.g. `127.0.0.1`.
    pub host: String,
    /// TCP port. `0` picks a free one.
    pub port: u16,
}

impl ServerConfig {
    /// Parse `host:port` into a socket address.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Address`] when the host is not an IP literal.
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|source| ServerError::Address { addr, source })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ObserverConfig::default())
    }
}

impl From<&ObserverConfig> for ServerConfig {
    fn from(config: &ObserverConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Failures while bringing up or running the observer.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured host and port do not form a socket address.
    #[error("invalid observer address {addr}: {source}")]
    Address {
        /// The rejected `host:port` string.
        addr: String,
        /// The parse failure.
        source: AddrParseError,
    },

    /// The listener could not be opened.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        /// Address the bind was attempted on.
        addr: SocketAddr,
        /// The I/O failure.
        source: std::io::Error,
    },

    /// Serving stopped with an I/O failure.
    #[error("observer stopped: {0}")]
    Serve(#[from] std::io::Error),
}

/// Open the observer's TCP listener.
///
/// # Errors
///
/// Returns [`ServerError::Address`] or [`ServerError::Bind`].
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = config.socket_addr()?;
    TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })
}

/// Serve the observer routes on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServerError::Serve`] on a fatal I/O error.
pub async fn serve<F>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "Observer listening");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Observer shut down");
    Ok(())
}
