//! Integration tests for logging system

use bridge_traits::logging::LogLevel;
use core_runtime::logging::{init_logging, strip_path, LogFormat, LoggingConfig};
use core_runtime::Error;

#[test]
fn test_logging_initializes_once() {
    // Only one global subscriber per process
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug);

    init_logging(config.clone()).unwrap();
    tracing::info!(target: "core_playback", track_id = "1", "Logging ready");

    let err = init_logging(config).unwrap_err();
    assert!(matches!(err, Error::Logging(_)));
}

#[test]
fn test_invalid_filter_is_config_error() {
    let config = LoggingConfig::default().with_filter("core_playback=notalevel");

    let err = init_logging(config).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[test]
fn test_track_uris_are_stripped() {
    assert_eq!(strip_path("file:///storage/emulated/0/Music/song.mp3"), "song.mp3");
    assert_eq!(strip_path("C:\\Users\\me\\Music\\intro.flac"), "intro.flac");
    assert_eq!(strip_path("song.mp3"), "song.mp3");
    assert_eq!(strip_path(""), "");
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_filter("core_playback=trace,core_library=warn")
        .with_target(false);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(
        config.filter.as_deref(),
        Some("core_playback=trace,core_library=warn")
    );
    assert!(!config.display_target);
}
