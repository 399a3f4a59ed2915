use anyhow::{Context, Result};
use std::fmt;
use std::io::{self, Write};
use std::path::Path;

use pgmig_core::{new_migration, Config, CoreError, CoreResult, MigrationEngine, StepMigration};

/// Engine operations available as one-shot commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up { steps: Option<i64> },
    Down { steps: Option<i64> },
    Redo,
    Force { version: i64 },
    Status,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Up { .. } => write!(f, "migrate up"),
            Action::Down { .. } => write!(f, "migrate down"),
            Action::Redo => write!(f, "redo"),
            Action::Force { .. } => write!(f, "force version"),
            Action::Status => write!(f, "status"),
        }
    }
}

/// Scaffold an empty up/down pair. Only the configuration is needed, not the database.
pub fn create(config_path: &Path, title: &str) -> Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load configuration from {}", config_path.display()))?;

    let pair = new_migration(&config.migrations_dir, title)
        .with_context(|| format!("failed to create migration \"{}\"", title))?;

    println!("Created migration:");
    println!("  UP: {}", pair.up.display());
    println!("  DOWN: {}", pair.down.display());
    Ok(())
}

/// Connect, run `action`, then close the connection
pub fn run(config_path: &Path, action: Action) -> Result<()> {
    let (_config, mut engine) = pgmig_core::open(config_path)
        .with_context(|| format!("failed to open database from {}", config_path.display()))?;

    let result = execute(&mut engine, action, &mut io::stdout().lock());
    let closed = engine.close();

    result?;
    closed.context("failed to close database connection")
}

/// Run `action` against `engine`, writing results to `out`.
///
/// An engine with nothing to do is reported as `no change` rather than an error.
pub fn execute<E, W>(engine: &mut E, action: Action, out: &mut W) -> Result<()>
where
    E: MigrationEngine + ?Sized,
    W: Write,
{
    let outcome: CoreResult<()> = match action {
        Action::Up { steps: None } => engine.up().map_err(CoreError::from),
        Action::Up { steps: Some(n) } => engine.up_n(n),
        Action::Down { steps: None } => engine.down().map_err(CoreError::from),
        Action::Down { steps: Some(n) } => engine.down_n(n),
        Action::Redo => engine.down_n(1).and_then(|()| engine.up_n(1)),
        Action::Force { version } => engine.force(version).map_err(CoreError::from),
        Action::Status => {
            let status = engine
                .version()
                .context("failed to read migration version")?;
            match status.version {
                Some(version) => write!(out, "version: {}", version)?,
                None => write!(out, "version: none")?,
            }
            if status.dirty {
                write!(out, " (dirty)")?;
            }
            writeln!(out)?;
            return Ok(());
        }
    };

    match outcome {
        Ok(()) => {
            if let Action::Force { version } = action {
                writeln!(out, "Forced Version: {}", version)?;
            }
            Ok(())
        }
        Err(e) if e.is_no_change() => {
            writeln!(out, "no change")?;
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context(format!("{} failed", action))),
    }
}
