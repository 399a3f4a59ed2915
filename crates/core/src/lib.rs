pub mod config;
pub mod engine;
pub mod errors;
pub mod scaffold;
pub mod wizard;

use std::path::Path;

// Re-export key types for convenience
pub use config::{Config, SslMode};
pub use engine::{EngineError, EngineVersion, MigrationEngine, PgEngine, StepMigration};
pub use errors::{CoreError, CoreResult};
pub use scaffold::{new_migration, MigrationPair};
pub use wizard::{Flow, MenuChoice, Shell, Wizard, WizardCommand, SHELL_PREFIX};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Load the configuration at `path` and connect the engine it describes.
///
/// The engine is returned alongside the configuration; call [`PgEngine::close`] when done.
pub fn open(path: impl AsRef<Path>) -> CoreResult<(Config, PgEngine)> {
    let config = Config::load(path)?;
    let engine = PgEngine::connect(&config.connection_string(), config.migrations_dir())?;
    Ok((config, engine))
}

/// Get pgmig version
pub fn version() -> &'static str {
    VERSION
}
