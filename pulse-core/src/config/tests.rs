use crate::config::model::*;
use crate::logging::LogLevel;

#[test]
fn test_default_config() {
    let config = Config::default();

    assert_eq!(config.server.port, 4000);
    assert_eq!(config.demo.error_upto, 0.2);
    assert_eq!(config.demo.slow_upto, 0.5);
    assert_eq!(config.demo.slow_delay_ms, 3000);
    assert_eq!(config.logging.queue_capacity, 1024);
    assert!(config.logging.console.enabled);
    assert!(!config.logging.file.enabled);
    assert!(!config.logging.collector.enabled);
    assert_eq!(config.logging.file.retention_days, 14);
}

#[test]
fn test_parse_full_config() {
    let toml_str = r#"
        [server]
        port = 8080

        [demo]
        error_upto = 0.1
        slow_upto = 0.3
        slow_delay_ms = 500

        [logging]
        queue_capacity = 256
        flush_interval_ms = 200

        [logging.console]
        enabled = true
        min_level = "warn"

        [logging.file]
        enabled = true
        dir = "/var/log/pulse"
        prefix = "demo"
        min_level = "error"
        retention_days = 7

        [logging.collector]
        enabled = true
        url = "http://collector:9428/insert"
        batch_size = 10
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.server.port, 8080);
    assert_eq!(config.demo.error_upto, 0.1);
    assert_eq!(config.logging.queue_capacity, 256);
    assert_eq!(config.logging.console.min_level, LogLevel::Warn);
    assert!(config.logging.file.enabled);
    assert_eq!(config.logging.file.dir, "/var/log/pulse");
    assert_eq!(config.logging.file.prefix, "demo");
    assert_eq!(config.logging.file.min_level, LogLevel::Error);
    assert_eq!(config.logging.file.retention_days, 7);
    assert_eq!(config.logging.collector.url, "http://collector:9428/insert");
    assert_eq!(config.logging.collector.batch_size, 10);
}

#[test]
fn test_partial_config_falls_back_to_defaults() {
    let toml_str = r#"
        [server]
        port = 9000
    "#;

    let config: Config = toml::from_str(toml_str).unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.demo.error_upto, 0.2);
    assert_eq!(config.logging.file.prefix, "pulse");
}

#[test]
fn test_malformed_config_is_rejected() {
    let toml_str = r#"
        [server]
        port = "not a number"
    "#;

    assert!(toml::from_str::<Config>(toml_str).is_err());
}

#[test]
fn test_classify_band_edges() {
    let demo = DemoConfig {
        error_upto: 0.2,
        slow_upto: 0.5,
        slow_delay_ms: 100,
    };

    assert_eq!(demo.classify(0.0), Outcome::Error);
    assert_eq!(demo.classify(0.1999), Outcome::Error);
    assert_eq!(demo.classify(0.2), Outcome::Slow);
    assert_eq!(demo.classify(0.4999), Outcome::Slow);
    assert_eq!(demo.classify(0.5), Outcome::Fast);
    assert_eq!(demo.classify(0.9999), Outcome::Fast);
}

#[test]
fn test_classify_degenerate_bands() {
    // All traffic forced into a single band
    let always_error = DemoConfig {
        error_upto: 1.0,
        slow_upto: 1.0,
        slow_delay_ms: 0,
    };
    assert_eq!(always_error.classify(0.9999), Outcome::Error);

    let never_error = DemoConfig {
        error_upto: 0.0,
        slow_upto: 0.0,
        slow_delay_ms: 0,
    };
    assert_eq!(never_error.classify(0.0), Outcome::Fast);
}
