//! linkstore server.
//!
//! Serves go-links style redirects and the link admin API.
//!
//! # Architecture Overview
//!
//! ```text
//!     GET /some/path                     POST /api/url/{name}
//!           │                                    │
//!           ▼                                    ▼
//!     ┌───────────┐                       ┌─────────────┐
//!     │   http    │──── resolve ─────────▶│    store    │
//!     │  server   │◀─── 307 Location ─────│ route codec │
//!     └───────────┘                       │ cursor/iter │
//!                                         └──────┬──────┘
//!                                                │
//!                               ┌────────────────┼──────────────┐
//!                               ▼                ▼              ▼
//!                          ┌─────────┐     ┌──────────┐    ┌─────────┐
//!                          │ embedded│     │  memory  │    │   ids   │
//!                          │  (redb) │     │ BTreeMap │    │allocator│
//!                          └─────────┘     └──────────┘    └─────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use linkstore::config::load_or_default;
use linkstore::lifecycle::startup;
use linkstore::observability::logging;

#[derive(Parser)]
#[command(name = "linkstore")]
#[command(about = "Pattern-based link redirect server", long_about = None)]
struct Args {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(args.config.as_deref())?;

    logging::init_tracing(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.api.request_timeout_secs,
        "linkstore starting"
    );

    startup::run(config).await
}
