use std::fs::File;
use std::path::PathBuf;

use crate::errors::CoreResult;

/// Up/down script pair for a single migration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPair {
    pub up: PathBuf,
    pub down: PathBuf,
}

impl MigrationPair {
    /// Plan the file names for `title` at Unix time `timestamp` under `migrations_dir`
    pub fn plan(migrations_dir: &str, title: &str, timestamp: i64) -> Self {
        let dir = migrations_dir.trim_end_matches('/');
        Self {
            up: PathBuf::from(format!("{}/{}_{}.up.sql", dir, timestamp, title)),
            down: PathBuf::from(format!("{}/{}_{}.down.sql", dir, timestamp, title)),
        }
    }

    pub fn up_name(&self) -> String {
        file_name(&self.up)
    }

    pub fn down_name(&self) -> String {
        file_name(&self.down)
    }

    /// Create both scripts as empty files, up first
    pub fn create(&self) -> CoreResult<()> {
        File::create(&self.up)?;
        File::create(&self.down)?;
        tracing::info!(up = %self.up.display(), down = %self.down.display(), "created migration files");
        Ok(())
    }
}

fn file_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Create an empty up/down pair stamped with the current Unix time
pub fn new_migration(migrations_dir: &str, title: &str) -> CoreResult<MigrationPair> {
    let pair = MigrationPair::plan(migrations_dir, title, chrono::Utc::now().timestamp());
    pair.create()?;
    Ok(pair)
}
