use std::process;

use evroute::config::Config;
use evroute::engine::Engine;
use evroute::server::serve;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(error = %err, "invalid configuration");
            process::exit(1);
        }
    };

    tracing::debug!(?config, "loaded configuration");

    // the model is loaded here, so a missing file stops startup
    let engine = match Engine::from_config(&config) {
        Ok(engine) => engine,
        Err(err) => {
            tracing::error!(kind = ?err.kind, error = %err, "startup failed");
            process::exit(1);
        }
    };

    if let Err(err) = serve(engine, config.bind_addr).await {
        tracing::error!(error = %err, "server stopped");
        process::exit(1);
    }
}
