//! Integration tests for loading configuration files from disk
//!
//! Covers the full `Config::load` path from a file on disk: TOML decoding, defaults, validation
//! and preparation of the migrations directory.

use std::fs;
use std::path::{Path, PathBuf};

use pgmig_core::config::parse_connection_string;
use pgmig_core::{Config, MigrationPair};
use tempfile::TempDir;

fn write_config(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).unwrap();
    path
}

fn base_config(migrations_dir: &Path, extra: &str) -> String {
    format!(
        "migrations_dir = \"{}\"\nhost = \"localhost\"\nport = \"5432\"\nuser = \"a\"\ndb = \"d\"\n{}",
        migrations_dir.display(),
        extra
    )
}

#[test]
fn test_load_minimal_config() {
    let temp = TempDir::new().unwrap();
    let migrations = temp.path().join("migrations");
    let path = write_config(temp.path(), "pgmig.toml", &base_config(&migrations, ""));

    let config = Config::load(&path).unwrap();

    assert_eq!(config.sslmode, "disable");
    assert_eq!(
        config.connection_string(),
        "user=a host=localhost port=5432 dbname=d sslmode=disable"
    );
    assert!(migrations.is_dir());
}

#[test]
fn test_load_ignores_unknown_keys() {
    let temp = TempDir::new().unwrap();
    let migrations = temp.path().join("migrations");
    let body = base_config(&migrations, "color = \"blue\"\n");
    let path = write_config(temp.path(), "pgmig.toml", &body);

    assert!(Config::load(&path).is_ok());
}

#[test]
fn test_password_survives_to_connection_string() {
    let temp = TempDir::new().unwrap();
    let migrations = temp.path().join("migrations");
    let body = base_config(&migrations, "pwd = \"it's\\\\back\"\n");
    let path = write_config(temp.path(), "pgmig.toml", &body);

    let config = Config::load(&path).unwrap();
    let pairs = parse_connection_string(&config.connection_string()).unwrap();
    let password = pairs
        .iter()
        .find(|(key, _)| key == "password")
        .map(|(_, value)| value.as_str());

    assert_eq!(password, Some("it's\\back"));
}

#[test]
fn test_password_with_spaces_fails_load() {
    let temp = TempDir::new().unwrap();
    let migrations = temp.path().join("migrations");
    let body = base_config(&migrations, "pwd = \"it's a pw\"\n");
    let path = write_config(temp.path(), "pgmig.toml", &body);

    let err = Config::load(&path).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(err.to_string(), "invalid pwd. whitespace is not allowed");
}

#[test]
fn test_non_numeric_port_fails_load() {
    let temp = TempDir::new().unwrap();
    let migrations = temp.path().join("migrations");
    let body = base_config(&migrations, "").replace("port = \"5432\"", "port = \"54x2\"");
    let path = write_config(temp.path(), "pgmig.toml", &body);

    let err = Config::load(&path).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().starts_with("invalid port \"54x2\""));
    assert!(!migrations.exists());
}

#[test]
fn test_loaded_directory_accepts_scaffolded_pair() {
    let temp = TempDir::new().unwrap();
    let migrations = temp.path().join("nested").join("migrations");
    let path = write_config(temp.path(), "pgmig.yaml", &base_config(&migrations, ""));

    let config = Config::load(&path).unwrap();
    let pair = MigrationPair::plan(&config.migrations_dir, "init", 1_700_000_000);
    pair.create().unwrap();

    assert!(migrations.join("1700000000_init.up.sql").exists());
    assert!(migrations.join("1700000000_init.down.sql").exists());
}
