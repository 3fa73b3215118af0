// Server module entry point
// Binds the configured listener and runs the accept loop until shutdown

pub mod connection;
pub mod listener;
pub mod signal;

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use crate::config::Config;
use crate::dispatch::Router;
use crate::logger;

pub use connection::{accept_connection, handle_request};
pub use listener::{create_reusable_listener, Listener};

/// Everything a connection task needs, shared read-only
pub struct ServerState {
    pub config: Config,
    pub router: Router,
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Unsupported server type {0:?}, only \"http\" is available")]
    UnsupportedType(String),
    #[error("{0}")]
    InvalidAddress(String),
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Check the server type, bind the listener and serve until SIGINT/SIGTERM.
pub async fn serve(state: Arc<ServerState>) -> Result<(), ServerError> {
    let server_type = state.config.server.server_type.as_str();
    if server_type != "http" {
        return Err(ServerError::UnsupportedType(server_type.to_string()));
    }

    let addr = state
        .config
        .listen_addr()
        .map_err(ServerError::InvalidAddress)?;
    let listener = Listener::bind(&addr).map_err(|source| ServerError::Bind {
        addr: addr.to_string(),
        source,
    })?;

    logger::log_server_start(&addr.to_string(), &state.config);

    let active_connections = Arc::new(AtomicUsize::new(0));
    let shutdown = signal::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = &mut shutdown => break,
        }
    }

    if let crate::config::ListenAddr::Unix(path) = &addr {
        if let Err(e) = std::fs::remove_file(path) {
            logger::log_warning(&format!("Failed to remove socket {path}: {e}"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(server_type: &str) -> Arc<ServerState> {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::load_from(&dir.path().join("none").to_string_lossy()).unwrap();
        config.server.server_type = server_type.to_string();
        Arc::new(ServerState {
            config,
            router: Router::new(),
        })
    }

    #[tokio::test]
    async fn test_fcgi_rejected() {
        let err = serve(state("fcgi")).await.unwrap_err();
        assert!(matches!(err, ServerError::UnsupportedType(ref t) if t == "fcgi"));
    }

    #[tokio::test]
    async fn test_invalid_address_rejected() {
        let state = state("http");
        let mut state = Arc::try_unwrap(state).ok().unwrap();
        state.config.server.bind = "not an address".to_string();
        let err = serve(Arc::new(state)).await.unwrap_err();
        assert!(matches!(err, ServerError::InvalidAddress(_)));
    }
}
