use std::fmt;
use std::str::FromStr;

use super::settings::Config;
use crate::errors::{CoreError, CoreResult};

const ILLEGAL_CHARS_HINT: &str = "single quotes and backslashes are not allowed";

/// Transport security levels understood by the PostgreSQL driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    #[default]
    Disable,
    Allow,
    Prefer,
    Require,
    VerifyCa,
    VerifyFull,
}

impl SslMode {
    pub const ALL: [SslMode; 6] = [
        SslMode::Disable,
        SslMode::Allow,
        SslMode::Prefer,
        SslMode::Require,
        SslMode::VerifyCa,
        SslMode::VerifyFull,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SslMode::Disable => "disable",
            SslMode::Allow => "allow",
            SslMode::Prefer => "prefer",
            SslMode::Require => "require",
            SslMode::VerifyCa => "verify-ca",
            SslMode::VerifyFull => "verify-full",
        }
    }
}

impl FromStr for SslMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SslMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| CoreError::validation(format!("invalid value \"{}\" for sslmode", s)))
    }
}

impl fmt::Display for SslMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a value can be embedded unquoted in the connection string
pub fn is_legal(value: &str) -> bool {
    !value.contains('\\') && !value.contains('\'')
}

fn check_legal(field: &str, value: &str) -> CoreResult<()> {
    if is_legal(value) {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "invalid {}. {}",
            field, ILLEGAL_CHARS_HINT
        )))
    }
}

/// Validate a loaded configuration.
///
/// Checks run in a fixed order and the first failure is returned.
pub fn validate(config: &Config) -> CoreResult<()> {
    check_legal("host", &config.host)?;

    config.port.parse::<i64>().map_err(|e| {
        CoreError::validation(format!("invalid port \"{}\": {}", config.port, e))
    })?;

    check_legal("user", &config.user)?;
    check_legal("db", &config.db)?;
    config.sslmode.parse::<SslMode>()?;
    check_legal("sslcert", &config.sslcert)?;
    check_legal("sslkey", &config.sslkey)?;

    if config.pwd.contains(char::is_whitespace) {
        return Err(CoreError::validation("invalid pwd. whitespace is not allowed"));
    }

    Ok(())
}
