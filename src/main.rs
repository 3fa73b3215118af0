use std::sync::Arc;

use dispatch_server::app::App;
use dispatch_server::config::{self, Config};
use dispatch_server::logger;
use dispatch_server::server::{self, ServerState};

mod controllers;

use controllers::{Hello, Static};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let cfg = Config::load_from(&config_path)?;
    logger::init(&cfg)?;

    let mut app = App::new();
    app.route("/hello", Arc::new(Hello))?;
    app.fallback("/", Arc::new(Static::new(&cfg.server.static_root)))?;
    let router = app.into_router()?;

    // Worker threads default to the number of CPU cores
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    let state = Arc::new(ServerState {
        config: cfg,
        router,
    });
    runtime.block_on(server::serve(state))?;

    logger::log_info("Server stopped");
    Ok(())
}
