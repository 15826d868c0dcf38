//! rewrite-proxy
//!
//! A forward proxy that fetches a remote resource and, for HTML, rewrites
//! every embedded reference to point back through itself.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                 REWRITE PROXY                 │
//!   GET /proxy?url=...   │  ┌──────────┐    ┌──────────┐    ┌─────────┐  │
//!  ──────────────────────┼─▶│   http   │───▶│  fetch   │───▶│ origin  │──┼──▶ Origin
//!                        │  │ handlers │    │  client  │◀───│response │◀─┼─── Server
//!                        │  └────┬─────┘    └──────────┘    └─────────┘  │
//!                        │       │ classify                              │
//!                        │       ├── text/html ──▶ rewrite engine        │
//!                        │       └── other ──────▶ passthrough           │
//!   Response             │       ▼                                       │
//!  ◀─────────────────────┼── response (CORS, request ID)                 │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use rewrite_proxy::config::validation::validate_config;
use rewrite_proxy::config::{load_or_default, ConfigError};
use rewrite_proxy::lifecycle::startup;
use rewrite_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "rewrite-proxy")]
#[command(about = "Forward proxy that rewrites HTML references back through itself", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability);
    tracing::info!("rewrite-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
