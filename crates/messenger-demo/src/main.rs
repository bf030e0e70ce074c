//! Messenger demo entry point
//!
//! Run with:
//! ```bash
//! cargo run -p messenger-demo
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use messenger_common::{try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_app(&config)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(env = ?config.app.env, name = %config.app.name, "Configuration loaded");

    if let Err(e) = messenger_demo::run(config).await {
        error!(error = %e, "Demo failed");
        std::process::exit(1);
    }
}
