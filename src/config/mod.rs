// Configuration module entry point
// Loads settings from an optional file, environment variables and defaults

mod types;

use std::net::SocketAddr;

pub use types::{Config, LoggingConfig, PerformanceConfig, ServerConfig};

/// Default config file (without extension) when no path is given
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Where the server should listen
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenAddr {
    Tcp(SocketAddr),
    Unix(String),
}

impl std::fmt::Display for ListenAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "{addr}"),
            Self::Unix(path) => write!(f, "unix:{path}"),
        }
    }
}

impl Config {
    /// Load configuration from specified file path (without extension)
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::builder(config_path)?.build()?.try_deserialize()
    }

    fn builder(
        config_path: &str,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.bind", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.socket", "")?
            .set_default("server.type", "http")?
            .set_default("server.request_max_size", 10_485_760)? // 10MB
            .set_default("server.static_root", "static")?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "common")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)
    }

    pub fn listen_addr(&self) -> Result<ListenAddr, String> {
        if !self.server.socket.is_empty() {
            return Ok(ListenAddr::Unix(self.server.socket.clone()));
        }
        format!("{}:{}", self.server.bind, self.server.port)
            .parse()
            .map(ListenAddr::Tcp)
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Body limit as a `usize`, saturating on narrow targets
    pub fn request_max_size(&self) -> usize {
        usize::try_from(self.server.request_max_size).unwrap_or(usize::MAX)
    }
}
