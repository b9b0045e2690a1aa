//! Search Signals Main Entry Point
//!
//! Reads model lifecycle events as JSON lines from standard input, dispatches
//! them through the signal bus and keeps the search index in sync.

use dotenv::dotenv;
use search_signals::{AppError, Dependencies};
use std::env;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging.
///
/// Logs go to stderr so they never mix with the event stream.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("search_signals=info,search_signals_repository=info"));

    let json_output = env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(true),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .pretty(),
            )
            .init();
    }

    info!(
        service_name = "search-signals",
        service_version = env!("CARGO_PKG_VERSION"),
        json_output = json_output,
        "Tracing initialized"
    );
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();

    init_tracing();

    info!("Starting search signal dispatcher");

    let mut deps = match Dependencies::new().await {
        Ok(deps) => {
            info!("Dependencies initialized successfully");
            deps
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize dependencies");
            return Err(e);
        }
    };

    match deps.orchestrator.run().await {
        Ok(()) => {
            info!("Signal dispatcher completed successfully");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Signal dispatcher failed");
            Err(e.into())
        }
    }
}
