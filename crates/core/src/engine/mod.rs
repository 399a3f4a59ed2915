//! Migration engine seam.
//!
//! pgmig never executes SQL itself. Everything that touches migration state goes through
//! [`MigrationEngine`]; [`PgEngine`] adapts sqlx's migrator to it.

pub mod postgres;

use thiserror::Error;

use crate::errors::{CoreError, CoreResult};

pub use postgres::PgEngine;

/// Errors reported by a migration engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Nothing to apply or revert. Informational, not a failure of the schema.
    #[error("no change")]
    NoChange,

    #[error("short limit: {short} fewer migration(s) available than requested")]
    ShortLimit { short: i64 },

    #[error("Dirty database version {version}. Fix and force version.")]
    Dirty { version: i64 },

    #[error("invalid connection string: {message}")]
    Connection { message: String },

    #[error("migration error: {0}")]
    Migrate(sqlx::migrate::MigrateError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

/// Applied-version marker as recorded by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineVersion {
    /// Highest applied version, `None` when nothing has been applied
    pub version: Option<i64>,
    pub dirty: bool,
}

/// Operations pgmig needs from a migration engine
pub trait MigrationEngine {
    /// Apply every pending migration
    fn up(&mut self) -> Result<(), EngineError>;

    /// Revert every applied migration
    fn down(&mut self) -> Result<(), EngineError>;

    /// Apply `n` pending migrations when positive, revert `|n|` when negative
    fn steps(&mut self, n: i64) -> Result<(), EngineError>;

    /// Record `version` as the applied version without running any SQL
    fn force(&mut self, version: i64) -> Result<(), EngineError>;

    fn version(&mut self) -> Result<EngineVersion, EngineError>;
}

const NON_POSITIVE_STEPS: &str = "argument 'n' must be a +ve integer";

/// Step-limited migrations with argument checking, available on every engine
pub trait StepMigration: MigrationEngine {
    fn up_n(&mut self, n: i64) -> CoreResult<()> {
        if n <= 0 {
            return Err(CoreError::invalid_argument(NON_POSITIVE_STEPS));
        }
        tracing::info!(steps = n, "migrating up");
        Ok(self.steps(n)?)
    }

    fn down_n(&mut self, n: i64) -> CoreResult<()> {
        if n <= 0 {
            return Err(CoreError::invalid_argument(NON_POSITIVE_STEPS));
        }
        tracing::info!(steps = n, "migrating down");
        Ok(self.steps(-n)?)
    }
}

impl<E: MigrationEngine + ?Sized> StepMigration for E {}


#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingEngine};
    use super::*;

    #[test]
    fn test_non_positive_steps_rejected() {
        let mut engine = RecordingEngine::default();

        for n in [0, -3] {
            assert!(engine.up_n(n).unwrap_err().is_invalid_argument());
            assert!(engine.down_n(n).unwrap_err().is_invalid_argument());
        }
        assert!(engine.calls.is_empty());
    }

    #[test]
    fn test_steps_delegate_with_sign() {
        let mut engine = RecordingEngine::default();

        engine.up_n(5).unwrap();
        engine.down_n(5).unwrap();

        assert_eq!(engine.calls, vec![Call::Steps(5), Call::Steps(-5)]);
    }

    #[test]
    fn test_engine_errors_surface_through_core_error() {
        let mut engine = RecordingEngine {
            fail_steps_below_zero: true,
            ..Default::default()
        };

        let err = engine.down_n(1).unwrap_err();
        assert!(matches!(err, CoreError::Engine(EngineError::Dirty { version: 7 })));
    }

    #[test]
    fn test_step_migration_through_trait_object() {
        let mut engine = RecordingEngine::default();
        let dyn_engine: &mut dyn MigrationEngine = &mut engine;

        dyn_engine.up_n(2).unwrap();
        assert_eq!(engine.calls, vec![Call::Steps(2)]);
    }
}
