//! Keyword/value connection strings in the libpq format.
//!
//! The builder emits `user`, `password`, `host`, `port`, `dbname`, `sslmode`, `sslcert` and `sslkey`
//! tokens in that order. Optional tokens are dropped when empty; `host`, `port`, `dbname` and
//! `sslmode` are always present so the driver sees every required key.

use super::settings::Config;
use crate::engine::EngineError;

/// Escape a value so it can be embedded unquoted in a connection string
pub fn escape_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Build the connection string handed to the migration engine
pub fn connection_string(config: &Config) -> String {
    let mut tokens = Vec::with_capacity(8);

    if !config.user.is_empty() {
        tokens.push(format!("user={}", config.user));
    }
    if !config.pwd.is_empty() {
        tokens.push(format!("password={}", config.pwd));
    }

    tokens.push(format!("host={}", config.host));
    tokens.push(format!("port={}", config.port));
    tokens.push(format!("dbname={}", config.db));
    tokens.push(format!("sslmode={}", config.sslmode));

    if !config.sslcert.is_empty() {
        tokens.push(format!("sslcert={}", config.sslcert));
    }
    if !config.sslkey.is_empty() {
        tokens.push(format!("sslkey={}", config.sslkey));
    }

    tokens.join(" ")
}

/// Parse a keyword/value connection string into ordered pairs.
///
/// Values start right after `=` and may be bare, where a backslash escapes the next character, or
/// single-quoted, where only `\'` and `\\` are escapes. A bare value may be empty.
pub fn parse_connection_string(input: &str) -> Result<Vec<(String, String)>, EngineError> {
    let mut pairs = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            break;
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        if chars.next() != Some('=') {
            return Err(EngineError::connection(format!(
                "missing \"=\" after \"{}\" in connection string",
                key
            )));
        }

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some(escaped) => value.push(escaped),
                        None => break,
                    },
                    Some('\'') => break,
                    Some(c) => value.push(c),
                    None => {
                        return Err(EngineError::connection(format!(
                            "unterminated quoted value for \"{}\" in connection string",
                            key
                        )))
                    }
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        value.push(escaped);
                    }
                } else {
                    value.push(c);
                }
            }
        }

        pairs.push((key, value));
    }

    Ok(pairs)
}
