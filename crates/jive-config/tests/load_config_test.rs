// Tests for loading configuration from TOML files.
#![allow(clippy::unwrap_used)]

use std::io::Write;
use std::time::Duration;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use jive_config::{Config, ConfigError, load_config};

// ── Helpers ─────────────────────────────────────────────────────────

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

// ── Tests ───────────────────────────────────────────────────────────

#[test]
fn test_partial_file_keeps_defaults_for_missing_keys() {
    let file = write_config(
        r#"
[katcp]
port = 7148

[jive]
host = "10.8.0.12"
poll_interval_secs = 30
"#,
    );

    let config = load_config(Some(file.path())).unwrap();

    assert_eq!(config.katcp.host, "0.0.0.0");
    assert_eq!(config.katcp.port, 7148);
    assert_eq!(config.jive.host, "10.8.0.12");
    assert_eq!(config.jive.port, 2620);
    assert_eq!(config.jive.timeout_ms, 1000);

    let bridge = config.bridge_config();
    assert_eq!(bridge.control_host, "10.8.0.12");
    assert_eq!(bridge.poll_interval, Duration::from_secs(30));
    assert_eq!(bridge.timeout, Duration::from_secs(1));
}

#[test]
fn test_rendered_config_loads_back() {
    let mut config = Config::default();
    config.jive.net2file_path = "/data/capture.vdif".into();
    config.jive.timeout_ms = 2500;
    let file = write_config(&config.to_toml().unwrap());

    let loaded = load_config(Some(file.path())).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = load_config(Some(&path)).unwrap_err();

    assert!(matches!(err, ConfigError::Missing { .. }));
    assert!(err.to_string().contains("absent.toml"));
}

#[test]
fn test_wrong_type_is_a_figment_error() {
    let file = write_config("[jive]\nport = \"twenty\"\n");

    let err = load_config(Some(file.path())).unwrap_err();

    assert!(matches!(err, ConfigError::Figment(_)));
}
