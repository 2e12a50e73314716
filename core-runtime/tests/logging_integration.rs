//! Integration tests for logging system

use bridge_traits::logging::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{
    default_filter, describe_text, init_logging, init_logging_once, redact_url, LogFormat,
    LoggingConfig,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LoggerSink for RecordingSink {
    fn log(&self, entry: LogEntry) -> bridge_traits::error::Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

#[test]
fn test_logging_configuration_builder() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Warn)
        .with_spans(false);

    assert_eq!(config.format, LogFormat::Compact);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(config.logger_sink.is_none());
}

// Only one global subscriber can exist per process, so initialization is
// exercised in a single test.
#[test]
fn test_global_init_forwards_to_sink_once() {
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).expect("first initialization succeeds");

    tracing::debug!(target: "core_playback::preparer", generation = 7u64, "prepared");
    tracing::debug!(target: "hyper::proto", "filtered out");

    {
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "prepared");
        assert_eq!(entries[0].fields.get("generation"), Some(&"7".to_string()));
    }

    assert!(init_logging(config.clone()).is_err());

    // Later instances keep the installed subscriber and say so.
    assert!(!init_logging_once(config).unwrap());
    let entries = sink.entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(
        entries[1].message,
        "Tracing subscriber already installed, keeping it"
    );
}

#[test]
fn test_default_filter_lists_engine_crates() {
    let filter = default_filter(LogLevel::Info);
    assert!(filter.contains("core_playback=info"));
    assert!(filter.contains("core_devices=info"));
    assert!(filter.contains("bridge_wasm=info"));
}

#[test]
fn test_speech_urls_are_redacted() {
    let redacted = redact_url("https://translate.google.com/translate_tts?ie=UTF-8&q=secret");
    assert!(!redacted.contains("secret"));
    assert!(redacted.starts_with("https://translate.google.com/translate_tts"));
    assert_eq!(describe_text("secret"), "<6 chars>");
}
