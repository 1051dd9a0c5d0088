//! Integration tests for configuration validation and loading

#![allow(clippy::expect_used, clippy::unwrap_used)]

use serial_test::serial;
use session_socket::config::{
    ClientConfig, LoggingConfig, NetworkConfig, ServerConfig, DEFAULT_SESSION_TTL,
};
use session_socket::ProtocolError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = NetworkConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
}

#[test]
fn test_empty_server_socket_path() {
    let mut config = NetworkConfig::default();
    config.server.socket_path = PathBuf::new();

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Server socket path cannot be empty")));
}

#[test]
fn test_missing_socket_directory() {
    let mut config = NetworkConfig::default();
    config.client.socket_path = PathBuf::from("/definitely/not/here/app.sock");

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Client socket directory does not exist")));
}

#[test]
fn test_socket_path_too_long() {
    let mut config = NetworkConfig::default();
    config.server.socket_path = PathBuf::from(format!("/tmp/{}.sock", "s".repeat(120)));

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("socket path too long")));
}

#[test]
fn test_zero_ttl_rejected() {
    let mut config = NetworkConfig::default();
    config.server.session_ttl = Duration::ZERO;

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("Session TTL out of range")));
}

#[test]
fn test_ttl_above_one_hour_rejected() {
    let config = ServerConfig::default().with_ttl(Duration::from_secs(3601));

    assert!(matches!(
        config.check_ttl(),
        Err(ProtocolError::InvalidTtl(3601))
    ));
    assert!(config
        .validate()
        .iter()
        .any(|e| e.contains("Session TTL out of range")));
}

#[test]
fn test_ttl_bounds_accepted() {
    for secs in [1, 600, 3600] {
        let config = ServerConfig::default().with_ttl(Duration::from_secs(secs));
        assert!(config.check_ttl().is_ok(), "ttl {secs}s should be accepted");
    }
}

#[test]
fn test_short_shutdown_timeout() {
    let mut config = NetworkConfig::default();
    config.server.shutdown_timeout = Duration::from_millis(50);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Shutdown timeout too short")));
}

#[test]
fn test_long_shutdown_timeout() {
    let mut config = NetworkConfig::default();
    config.server.shutdown_timeout = Duration::from_secs(120);

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Shutdown timeout too long")));
}

#[test]
fn test_empty_app_name() {
    let mut config = NetworkConfig::default();
    config.logging.app_name = String::new();

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("Application name cannot be empty")));
}

#[test]
fn test_log_to_file_without_path() {
    let mut config = NetworkConfig::default();
    config.logging.log_to_file = true;
    config.logging.log_file_path = None;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("log_file_path must be specified")));
}

#[test]
fn test_no_logging_outputs() {
    let mut config = NetworkConfig::default();
    config.logging.log_to_console = false;
    config.logging.log_to_file = false;

    let errors = config.validate();
    assert!(errors
        .iter()
        .any(|e| e.contains("At least one logging output")));
}

#[test]
fn test_validate_strict_with_invalid_config() {
    let mut config = NetworkConfig::default();
    config.server.socket_path = PathBuf::new();
    config.logging.app_name = String::new();

    let err = config.validate_strict().unwrap_err();
    let text = err.to_string();
    assert!(text.contains("Configuration validation failed"));
    assert!(text.contains("Server socket path cannot be empty"));
    assert!(text.contains("Application name cannot be empty"));
}

#[test]
fn test_partial_toml_fills_defaults() {
    let config = NetworkConfig::from_toml(
        r#"
        [server]
        socket_path = "/tmp/partial.sock"
        session_ttl = 30
        "#,
    )
    .expect("partial config should parse");

    assert_eq!(config.server.socket_path, PathBuf::from("/tmp/partial.sock"));
    assert_eq!(config.server.session_ttl, Duration::from_secs(30));
    assert!(!config.server.force);
    assert_eq!(config.logging.log_level, Level::INFO);
}

#[test]
fn test_malformed_toml_is_config_error() {
    let err = NetworkConfig::from_toml("[server\nsocket_path = 1").unwrap_err();
    assert!(matches!(err, ProtocolError::ConfigError(_)));
}

#[test]
fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.toml");

    let config = NetworkConfig::default_with_overrides(|c| {
        c.server.socket_path = dir.path().join("app.sock");
        c.server.force = true;
        c.server.session_ttl = Duration::from_secs(120);
        c.logging.log_level = Level::DEBUG;
    });
    config.save_to_file(&file).unwrap();

    let loaded = NetworkConfig::from_file(&file).unwrap();
    assert_eq!(loaded.server.socket_path, config.server.socket_path);
    assert!(loaded.server.force);
    assert_eq!(loaded.server.session_ttl, Duration::from_secs(120));
    assert_eq!(loaded.logging.log_level, Level::DEBUG);
}

#[test]
fn test_example_config_parses() {
    let example = NetworkConfig::example_config();
    let parsed = NetworkConfig::from_toml(&example).unwrap();
    assert_eq!(parsed.server.session_ttl, DEFAULT_SESSION_TTL);
}

#[test]
#[serial]
fn test_from_env_overrides() {
    std::env::set_var("SESSION_SOCKET_PATH", "/tmp/from-env.sock");
    std::env::set_var("SESSION_SOCKET_TTL_SECS", "45");
    std::env::set_var("SESSION_SOCKET_FORCE", "yes");
    std::env::set_var("SESSION_SOCKET_LOG_LEVEL", "warn");

    let config = NetworkConfig::from_env();

    std::env::remove_var("SESSION_SOCKET_PATH");
    std::env::remove_var("SESSION_SOCKET_TTL_SECS");
    std::env::remove_var("SESSION_SOCKET_FORCE");
    std::env::remove_var("SESSION_SOCKET_LOG_LEVEL");

    let config = config.unwrap();
    assert_eq!(config.server.socket_path, PathBuf::from("/tmp/from-env.sock"));
    assert_eq!(config.client.socket_path, PathBuf::from("/tmp/from-env.sock"));
    assert_eq!(config.server.session_ttl, Duration::from_secs(45));
    assert!(config.server.force);
    assert_eq!(config.logging.log_level, Level::WARN);
}

#[test]
#[serial]
fn test_from_env_rejects_bad_ttl() {
    std::env::set_var("SESSION_SOCKET_TTL_SECS", "ten");
    let result = NetworkConfig::from_env();
    std::env::remove_var("SESSION_SOCKET_TTL_SECS");

    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_valid_production_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = NetworkConfig {
        server: ServerConfig::new(dir.path().join("prod.sock"))
            .with_force(true)
            .with_ttl(Duration::from_secs(900))
            .with_shutdown_timeout(Duration::from_secs(5)),
        client: ClientConfig {
            socket_path: dir.path().join("prod.sock"),
        },
        logging: LoggingConfig {
            app_name: "production-server".to_string(),
            log_level: Level::INFO,
            log_to_console: true,
            log_to_file: true,
            log_file_path: Some(dir.path().join("server.log").display().to_string()),
            json_format: true,
        },
    };

    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Production config should be valid, got: {:?}",
        errors
    );
}
