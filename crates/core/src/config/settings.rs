use serde::de::Error as _;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use super::connection::{connection_string, escape_value};
use super::validation::{validate, SslMode};
use crate::errors::{CoreError, CoreResult};

/// Connection and path settings read from the configuration file.
///
/// Values stay as the strings found in the file; the validated path is `Config::load`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub migrations_dir: String,
    pub host: String,
    pub port: String,
    pub user: String,
    pub pwd: String,
    pub db: String,
    pub sslmode: String,
    pub sslcert: String,
    pub sslkey: String,
}

impl Config {
    /// Load, normalize and validate a configuration file, then make sure the migrations
    /// directory exists.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        if !is_supported_file(path) {
            return Err(CoreError::InvalidPath {
                path: path.to_path_buf(),
            });
        }

        let raw = fs::read(path)?;
        let text = String::from_utf8(raw).map_err(|e| {
            toml::de::Error::custom(format!("configuration is not valid UTF-8: {}", e))
        })?;
        let mut config: Config = toml::from_str(&text)?;
        config.apply_defaults();

        config.validate()?;
        config.ensure_migrations_dir()?;

        tracing::debug!(
            path = %path.display(),
            migrations_dir = %config.migrations_dir,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Fill the SSL mode default and escape the password for embedding
    pub fn apply_defaults(&mut self) {
        if self.sslmode.is_empty() {
            self.sslmode = SslMode::default().to_string();
        }
        self.pwd = escape_value(&self.pwd);
    }

    pub fn validate(&self) -> CoreResult<()> {
        validate(self)
    }

    pub fn connection_string(&self) -> String {
        connection_string(self)
    }

    pub fn migrations_dir(&self) -> &Path {
        Path::new(&self.migrations_dir)
    }

    /// Make `migrations_dir` a directory, replacing any non-directory entry at that path
    pub fn ensure_migrations_dir(&self) -> CoreResult<()> {
        ensure_directory(&self.migrations_dir)
    }
}

/// Anything but JSON is treated as TOML
fn is_supported_file(path: &Path) -> bool {
    !path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub(crate) fn ensure_directory(dir: &str) -> CoreResult<()> {
    if dir.is_empty() {
        return Err(CoreError::directory(dir, None));
    }

    let fail = |e: std::io::Error| CoreError::directory(dir, Some(e));
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => {
            tracing::warn!(path = dir, "migrations path is not a directory, replacing it");
            fs::remove_file(dir).map_err(fail)?;
            fs::create_dir_all(dir).map_err(fail)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path = dir, "creating migrations directory");
            fs::create_dir_all(dir).map_err(fail)
        }
        Err(e) => Err(fail(e)),
    }
}
