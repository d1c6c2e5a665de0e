//! label-proxy
//!
//! Forwards the site's `/api/*` calls to the backend API, injecting the
//! server-side API key, and relays uploaded images and submission audio.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request      ┌──────────────────────────────────────────────┐
//!     ────────────────────┼─▶ http::server (request id, trace, limits)   │
//!                         │        │                                     │
//!                         │        ├─▶ /api/health ─▶ http::health       │
//!                         │        ├─▶ images / audio ─▶ forward::resource
//!                         │        └─▶ /api/{*path} ─▶ forward::handler  │
//!                         │                 │                            │
//!                         │                 ▼                            │
//!                         │      forward::upstream (reqwest, timeout) ───┼──▶ Backend API
//!                         │                                              │
//!                         │  config · observability · lifecycle          │
//!                         └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use label_proxy::config;
use label_proxy::lifecycle::{startup, Shutdown};
use label_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "label-proxy", version)]
#[command(about = "Streaming API proxy for the label site", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = config::load(args.config.as_deref(), |name| std::env::var(name).ok())?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "label-proxy starting");

    startup::run(config, Shutdown::new()).await?;
    Ok(())
}
