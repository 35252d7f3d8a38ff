//! Logging system demonstration
//!
//! Run with:
//! ```bash
//! # Pretty format (default in debug)
//! cargo run --example logging_demo
//!
//! # JSON format
//! cargo run --example logging_demo -- json
//!
//! # Custom filter, mirrored to the console sink
//! cargo run --example logging_demo -- compact "core_runtime=trace"
//! ```

use bridge_traits::logging::{ConsoleLogger, LogLevel};
use core_runtime::logging::{init_logging, redact_url, LogFormat, LoggingConfig};
use std::env;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();

    let format = match args.get(1).map(String::as_str) {
        Some("json") => LogFormat::Json,
        Some("compact") => LogFormat::Compact,
        Some(_) => LogFormat::Pretty,
        None => LogFormat::default(),
    };

    let mut config = LoggingConfig::default()
        .with_format(format)
        .with_level(LogLevel::Trace)
        .with_target(true);

    if let Some(filter) = args.get(2) {
        config = config
            .with_filter(filter.clone())
            .with_logger_sink(Arc::new(ConsoleLogger {
                min_level: LogLevel::Warn,
            }));
    }

    init_logging(config).expect("Failed to initialize logging");

    info!(format = ?format, "Logging initialized");

    let url = "https://cdn.example.com/audio/track.mp3?X-Amz-Signature=deadbeef";
    probe_candidate(url, 1).await;
    probe_candidate(url, 2).await;

    info!("=== Demo Complete ===");
}

#[instrument(skip(url), fields(url = %redact_url(url)))]
async fn probe_candidate(url: &str, attempt: u32) {
    debug!(attempt, "Probing candidate");
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    if attempt == 1 {
        warn!(attempt, "Probe timed out, trying next candidate");
    } else {
        info!(attempt, "Candidate playable");
    }
}
