mod commands;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::migrate::{self, Action};
use logging::{init_logging, LoggingConfig};

#[derive(Parser, Debug)]
#[command(name = "pgmig")]
#[command(version, about = "Interactive wizard for versioned PostgreSQL schema migrations")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, short, env = "PGMIG_CONFIG", default_value = "pgmig.toml", global = true)]
    config: PathBuf,

    /// Show debug logs
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Log level or filter directives, overrides --verbose
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Run the interactive wizard (default)
    Wizard,

    /// Create an empty up/down migration pair
    New {
        /// Migration title, used in the file names
        title: String,
    },

    /// Apply pending migrations
    Up {
        /// Apply only this many migrations
        #[arg(long, allow_negative_numbers = true)]
        steps: Option<i64>,
    },

    /// Revert applied migrations
    Down {
        /// Revert only this many migrations
        #[arg(long, allow_negative_numbers = true)]
        steps: Option<i64>,
    },

    /// Revert the last migration and apply it again
    Redo,

    /// Record a version as applied without running any SQL
    Force {
        /// Version to record; negative clears all bookkeeping
        #[arg(allow_negative_numbers = true)]
        version: i64,
    },

    /// Show the applied version and dirty flag
    Status,
}

impl Cli {
    fn logging_config(&self) -> LoggingConfig {
        let config = if self.verbose {
            LoggingConfig::verbose()
        } else {
            LoggingConfig::default()
        };
        let config = match &self.log_level {
            Some(level) => config.with_level(level.as_str()),
            None => config,
        };
        config.with_json(self.json_logs)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.logging_config())?;

    let config_path = cli.config.as_path();
    match cli.command.unwrap_or(Commands::Wizard) {
        Commands::Wizard => commands::wizard::run(config_path),
        Commands::New { title } => migrate::create(config_path, &title),
        Commands::Up { steps } => migrate::run(config_path, Action::Up { steps }),
        Commands::Down { steps } => migrate::run(config_path, Action::Down { steps }),
        Commands::Redo => migrate::run(config_path, Action::Redo),
        Commands::Force { version } => migrate::run(config_path, Action::Force { version }),
        Commands::Status => migrate::run(config_path, Action::Status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wizard_is_default() {
        let cli = Cli::try_parse_from(["pgmig"]).unwrap();
        assert_eq!(cli.command, None);
        assert!(!cli.verbose);
        assert_eq!(cli.logging_config(), LoggingConfig::default());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "pgmig", "up", "--steps", "2", "-c", "db/pgmig.toml", "--json-logs",
        ])
        .unwrap();

        assert_eq!(cli.command, Some(Commands::Up { steps: Some(2) }));
        assert_eq!(cli.config, PathBuf::from("db/pgmig.toml"));
        assert!(cli.logging_config().json_format);
    }

    #[test]
    fn test_negative_numbers_reach_the_engine_rules() {
        let cli = Cli::try_parse_from(["pgmig", "force", "-1"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Force { version: -1 }));

        let cli = Cli::try_parse_from(["pgmig", "down", "--steps", "-3"]).unwrap();
        assert_eq!(cli.command, Some(Commands::Down { steps: Some(-3) }));
    }

    #[test]
    fn test_new_requires_title() {
        assert!(Cli::try_parse_from(["pgmig", "new"]).is_err());

        let cli = Cli::try_parse_from(["pgmig", "new", "add_users"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::New {
                title: "add_users".to_string()
            })
        );
    }

    #[test]
    fn test_log_level_overrides_verbose() {
        let cli = Cli::try_parse_from(["pgmig", "-v", "--log-level", "info", "status"]).unwrap();
        assert_eq!(cli.logging_config().directives(), "info");

        let cli = Cli::try_parse_from(["pgmig", "-v"]).unwrap();
        assert!(cli.logging_config().directives().contains("debug"));
    }

    #[test]
    fn test_force_rejects_non_integer() {
        assert!(Cli::try_parse_from(["pgmig", "force", "latest"]).is_err());
    }
}
