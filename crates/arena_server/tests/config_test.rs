//! Tests for server configuration loading.

use arena_server::ServerConfig;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = ServerConfig::default();
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(*config.port(), 3000);
    assert_eq!(config.bind_addr(), "127.0.0.1:3000");
}

#[test]
fn test_from_file_fills_missing_fields() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "port = 4100").expect("write");

    let config = ServerConfig::from_file(file.path()).expect("valid config");
    assert_eq!(*config.port(), 4100);
    assert_eq!(config.host(), "127.0.0.1");
    assert_eq!(config.log_filter(), "info,arena_server=debug");
}

#[test]
fn test_from_file_rejects_bad_toml() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "port = \"not a number\"").expect("write");

    let err = ServerConfig::from_file(file.path()).expect_err("invalid config");
    assert!(err.message.contains("Failed to parse config"));
}

#[test]
fn test_from_file_missing() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = ServerConfig::from_file(dir.path().join("absent.toml")).expect_err("missing");
    assert!(err.message.contains("Failed to read config file"));
}

#[test]
fn test_overrides_win() {
    let config = ServerConfig::default().with_overrides(Some("0.0.0.0".into()), Some(8080));
    assert_eq!(config.bind_addr(), "0.0.0.0:8080");

    let untouched = ServerConfig::default().with_overrides(None, None);
    assert_eq!(untouched, ServerConfig::default());
}
