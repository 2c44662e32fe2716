use super::*;

#[test]
fn test_config_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.jobs, 8);
    assert_eq!(config.net_timeout, 30);
    assert_eq!(config.log_level, 0);
    assert_eq!(config.color, ColorIntent::Auto);
    assert_eq!(config.output, OutputFormat::Json);
    assert_eq!(config.thoth_url, DEFAULT_THOTH_URL);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_merging() {
    let base = AppConfig {
        thoth_url: "http://from-env.example".to_string(),
        ..AppConfig::default()
    };
    let override_config = AppConfig {
        log_level: 4,
        color: ColorIntent::Never,
        jobs: 16,
        output: OutputFormat::JsonCompact,
        ..AppConfig::default()
    };

    let merged = base.merge_with(override_config);
    assert_eq!(merged.log_level, 4);
    assert_eq!(merged.color, ColorIntent::Never);
    assert_eq!(merged.jobs, 16);
    assert_eq!(merged.output, OutputFormat::JsonCompact);
    assert_eq!(merged.net_timeout, 30);
    // default-valued fields never clobber earlier layers
    assert_eq!(merged.thoth_url, "http://from-env.example");
}

#[test]
fn test_validate_rejects_zero_jobs() {
    let config = AppConfig {
        jobs: 0,
        ..AppConfig::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationFailed { .. })
    ));
}

#[test]
fn test_validate_rejects_empty_url() {
    let config = AppConfig {
        license_url: "  ".to_string(),
        ..AppConfig::default()
    };
    match config.validate() {
        Err(ConfigError::ValidationFailed { reason }) => assert!(reason.contains("license-url")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_logger_config_resolves_color() {
    let config = AppConfig {
        log_level: 3,
        ..AppConfig::default()
    };

    let on_terminal = config.to_logger_config(true);
    assert_eq!(on_terminal.level, LogLevel::Debug);
    assert!(on_terminal.color);
    assert!(!config.to_logger_config(false).color);
}

#[test]
fn test_networking_config() {
    let config = AppConfig {
        jobs: 3,
        net_timeout: 5,
        log_level: 4,
        ..AppConfig::default()
    };

    let networking = config.networking_config();
    assert_eq!(networking.max_jobs, 3);
    assert_eq!(networking.timeout_seconds, 5);
    assert!(networking.trace_requests);
}
