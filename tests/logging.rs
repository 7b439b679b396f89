use response_rewrite_proxy::config::LoggingConfig;
use response_rewrite_proxy::logging::init_logging;

// One test per binary: the subscriber is process-global
#[test]
fn test_plain_file_logging_with_console() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("proxy.log");

    let config = LoggingConfig {
        level: "info".to_string(),
        file: Some(path.to_string_lossy().into_owned()),
        json: false,
        rotation: false,
    };

    let guard = init_logging(&config).unwrap();
    assert!(guard.is_some());

    tracing::error!("file logging smoke test");
    drop(guard);

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("file logging smoke test"));
    assert!(!content.contains("\u{1b}["));
}
