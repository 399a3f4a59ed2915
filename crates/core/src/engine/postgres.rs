//! sqlx-backed engine.
//!
//! Wraps a single `PgConnection` and the `Migrator` loaded from the migrations directory. sqlx is
//! async, pgmig is not: the engine owns a current-thread runtime and blocks on it for each call.

use sqlx::migrate::{AppliedMigration, Migrate, MigrateError, Migration, Migrator};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgSslMode};
use sqlx::Connection;
use std::collections::HashSet;
use std::path::Path;
use tokio::runtime::{Builder, Runtime};

use super::{EngineError, EngineVersion, MigrationEngine};
use crate::config::parse_connection_string;

/// Bookkeeping table maintained by sqlx's migrator
const MIGRATIONS_TABLE: &str = "_sqlx_migrations";

impl From<MigrateError> for EngineError {
    fn from(error: MigrateError) -> Self {
        match error {
            MigrateError::Dirty(version) => EngineError::Dirty { version },
            other => EngineError::Migrate(other),
        }
    }
}

/// Translate a keyword/value connection string into sqlx connect options
pub fn connect_options(connection_string: &str) -> Result<PgConnectOptions, EngineError> {
    let mut options = PgConnectOptions::new();

    for (key, value) in parse_connection_string(connection_string)? {
        options = match key.as_str() {
            "host" | "port" | "dbname" if value.is_empty() => options,
            "host" => options.host(&value),
            "port" => {
                let port = value.parse::<u16>().map_err(|_| {
                    EngineError::connection(format!("invalid port \"{}\"", value))
                })?;
                options.port(port)
            }
            "user" => options.username(&value),
            "password" => options.password(&value),
            "dbname" => options.database(&value),
            "sslmode" => {
                let mode = value.parse::<PgSslMode>().map_err(|_| {
                    EngineError::connection(format!("invalid sslmode \"{}\"", value))
                })?;
                options.ssl_mode(mode)
            }
            "sslcert" => options.ssl_client_cert(&value),
            "sslkey" => options.ssl_client_key(&value),
            other => {
                return Err(EngineError::connection(format!(
                    "unsupported keyword \"{}\"",
                    other
                )))
            }
        };
    }

    Ok(options)
}

/// Migration engine over a live PostgreSQL connection
pub struct PgEngine {
    runtime: Runtime,
    conn: PgConnection,
    migrator: Migrator,
}

impl PgEngine {
    /// Open a connection and load the migration source
    pub fn connect(connection_string: &str, migrations_dir: &Path) -> Result<Self, EngineError> {
        let options = connect_options(connection_string)?;
        let runtime = Builder::new_current_thread().enable_all().build()?;

        let source = migrations_dir.to_path_buf();
        let (conn, migrator) = runtime.block_on(async move {
            let migrator = Migrator::new(source).await?;
            let conn = PgConnection::connect_with(&options).await?;
            Ok::<_, EngineError>((conn, migrator))
        })?;

        tracing::info!(
            migrations = migrator.iter().count(),
            dir = %migrations_dir.display(),
            "connected to database"
        );

        Ok(Self {
            runtime,
            conn,
            migrator,
        })
    }

    /// Close the connection, letting the server release its session cleanly
    pub fn close(self) -> Result<(), EngineError> {
        let Self { runtime, conn, .. } = self;
        runtime.block_on(conn.close())?;
        Ok(())
    }
}

impl MigrationEngine for PgEngine {
    fn up(&mut self) -> Result<(), EngineError> {
        let Self {
            runtime,
            conn,
            migrator,
        } = self;

        runtime.block_on(async move {
            let applied = applied_versions(conn).await?;
            if pending(migrator, &applied).next().is_none() {
                return Err(EngineError::NoChange);
            }
            migrator.run(&mut *conn).await?;
            Ok(())
        })
    }

    fn down(&mut self) -> Result<(), EngineError> {
        let Self {
            runtime,
            conn,
            migrator,
        } = self;

        runtime.block_on(async move {
            if applied_versions(conn).await?.is_empty() {
                return Err(EngineError::NoChange);
            }
            migrator.undo(&mut *conn, -1).await?;
            Ok(())
        })
    }

    fn steps(&mut self, n: i64) -> Result<(), EngineError> {
        let Self {
            runtime,
            conn,
            migrator,
        } = self;

        runtime.block_on(async move {
            conn.lock().await?;
            let result = if n >= 0 {
                step_up(conn, migrator, n).await
            } else {
                step_down(conn, migrator, -n).await
            };
            conn.unlock().await?;
            result
        })
    }

    fn force(&mut self, version: i64) -> Result<(), EngineError> {
        let Self {
            runtime,
            conn,
            migrator,
        } = self;

        runtime.block_on(async move {
            conn.ensure_migrations_table().await?;

            let mut tx = conn.begin().await?;
            sqlx::query(&format!(
                "DELETE FROM {} WHERE version > $1 OR success = FALSE",
                MIGRATIONS_TABLE
            ))
            .bind(version)
            .execute(&mut *tx)
            .await?;

            let insert = format!(
                "INSERT INTO {} (version, description, success, checksum, execution_time) \
                 VALUES ($1, $2, TRUE, $3, 0) ON CONFLICT (version) DO NOTHING",
                MIGRATIONS_TABLE
            );
            for migration in migrator
                .iter()
                .filter(|m| !m.migration_type.is_down_migration() && m.version <= version)
            {
                sqlx::query(&insert)
                    .bind(migration.version)
                    .bind(&*migration.description)
                    .bind(&*migration.checksum)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            tracing::info!(version, "forced migration version");
            Ok(())
        })
    }

    fn version(&mut self) -> Result<EngineVersion, EngineError> {
        let Self { runtime, conn, .. } = self;

        runtime.block_on(async move {
            conn.ensure_migrations_table().await?;
            let dirty = conn.dirty_version().await?;
            let applied = conn.list_applied_migrations().await?;
            Ok(EngineVersion {
                version: applied.iter().map(|m| m.version).max(),
                dirty: dirty.is_some(),
            })
        })
    }
}

async fn applied_versions(conn: &mut PgConnection) -> Result<HashSet<i64>, EngineError> {
    conn.ensure_migrations_table().await?;
    if let Some(version) = conn.dirty_version().await? {
        return Err(EngineError::Dirty { version });
    }
    let applied: Vec<AppliedMigration> = conn.list_applied_migrations().await?;
    Ok(applied.into_iter().map(|m| m.version).collect())
}

/// Up migrations not yet applied, in version order
fn pending<'m>(
    migrator: &'m Migrator,
    applied: &'m HashSet<i64>,
) -> impl Iterator<Item = &'m Migration> + 'm {
    migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .filter(move |m| !applied.contains(&m.version))
}

async fn step_up(conn: &mut PgConnection, migrator: &Migrator, n: i64) -> Result<(), EngineError> {
    let applied = applied_versions(conn).await?;
    let batch: Vec<&Migration> = pending(migrator, &applied).take(n as usize).collect();
    if batch.is_empty() {
        return Err(EngineError::NoChange);
    }

    for migration in &batch {
        let elapsed = conn.apply(migration).await?;
        tracing::info!(
            version = migration.version,
            description = %migration.description,
            ?elapsed,
            "applied migration"
        );
    }

    short_limit(n, batch.len())
}

async fn step_down(conn: &mut PgConnection, migrator: &Migrator, n: i64) -> Result<(), EngineError> {
    let mut applied: Vec<i64> = applied_versions(conn).await?.into_iter().collect();
    if applied.is_empty() {
        return Err(EngineError::NoChange);
    }
    applied.sort_unstable_by(|a, b| b.cmp(a));
    applied.truncate(n as usize);

    for version in &applied {
        let migration = migrator
            .iter()
            .find(|m| m.version == *version && m.migration_type.is_down_migration())
            .ok_or(MigrateError::VersionMissing(*version))?;
        let elapsed = conn.revert(migration).await?;
        tracing::info!(
            version = migration.version,
            description = %migration.description,
            ?elapsed,
            "reverted migration"
        );
    }

    short_limit(n, applied.len())
}

fn short_limit(requested: i64, done: usize) -> Result<(), EngineError> {
    let short = requested - done as i64;
    if short > 0 {
        Err(EngineError::ShortLimit { short })
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_from_generated_string() {
        let options = connect_options(
            "user=a password=it\\'s host=db.internal port=6543 dbname=d sslmode=require",
        )
        .unwrap();

        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_username(), "a");
        assert_eq!(options.get_database(), Some("d"));
    }

    #[test]
    fn test_connect_options_rejects_bad_values() {
        assert!(connect_options("host=h port=99999 dbname=d sslmode=disable").is_err());
        assert!(connect_options("host=h port=5432 dbname=d sslmode=sometimes").is_err());
        assert!(connect_options("host=h port=5432 dbname=d sslmode=disable timezone=UTC").is_err());
    }

    #[test]
    fn test_short_limit() {
        assert!(short_limit(3, 3).is_ok());
        assert!(matches!(
            short_limit(5, 2),
            Err(EngineError::ShortLimit { short: 3 })
        ));
    }

    #[test]
    fn test_dirty_migrate_error_maps_to_dirty() {
        let err = EngineError::from(MigrateError::Dirty(42));
        assert!(matches!(err, EngineError::Dirty { version: 42 }));
    }
}
