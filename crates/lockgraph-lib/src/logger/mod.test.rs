use super::*;

#[test]
fn test_default_filter_scopes_lockgraph_targets() {
    let filter = default_filter(LogLevel::Debug);
    assert!(filter.starts_with("lockgraph=debug,lockgraph_lib=debug"));
    assert!(filter.contains("reqwest=warn"));
    assert!(filter.ends_with(",debug"));
}

#[test]
fn test_default_filter_parses_as_env_filter() {
    for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
        assert!(EnvFilter::try_new(default_filter(level)).is_ok());
    }
}

#[test]
fn test_logger_not_initialized_initially() {
    // Unit tests never install the global subscriber
    assert!(!Logger::is_initialized() || Logger::global().is_some());
}
