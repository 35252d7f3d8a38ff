//! Integration tests for logging system

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{init_logging, redact_url, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

#[async_trait]
impl LoggerSink for CollectingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// The global subscriber can only be installed once per process, so every
// assertion that needs it lives in this one test.
#[test]
fn test_global_logging_mirrors_into_sink() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config).unwrap();

    tracing::info!(target: "core_playback::playlist", index = 3_u64, "Track loaded");
    tracing::trace!(target: "core_playback::playlist", "filtered out");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].message, "Track loaded");
        assert_eq!(entries[0].fields.get("index"), Some(&"3".to_string()));
    }

    let again = init_logging(LoggingConfig::default());
    assert!(matches!(again, Err(Error::Config(_))));
}

#[test]
fn test_format_selection() {
    #[cfg(debug_assertions)]
    assert_eq!(LoggingConfig::default().format, LogFormat::Pretty);

    #[cfg(not(debug_assertions))]
    assert_eq!(LoggingConfig::default().format, LogFormat::Json);
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_filter("core_playback=debug,core_runtime=trace")
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(
        config.filter.as_deref(),
        Some("core_playback=debug,core_runtime=trace")
    );
    assert!(config.logger_sink.is_none());
    assert!(!config.display_target);
    assert!(config.display_thread_info);
}

#[test]
fn test_signed_media_urls_are_redacted() {
    assert_eq!(
        redact_url("https://cdn.example.com/audio/track.mp3?X-Amz-Signature=abc123"),
        "https://cdn.example.com/audio/track.mp3?[REDACTED]"
    );
    assert_eq!(
        redact_url("https://cdn.example.com/audio/track.ogg"),
        "https://cdn.example.com/audio/track.ogg"
    );
    assert_eq!(redact_url(""), "");
}
