use anyhow::{Context, Result};
use std::path::Path;

use pgmig_core::{Shell, Wizard};

/// Run the interactive wizard on stdin/stdout until the user quits
pub fn run(config_path: &Path) -> Result<()> {
    let (config, mut engine) = pgmig_core::open(config_path)
        .with_context(|| format!("failed to open database from {}", config_path.display()))?;

    let result = Wizard::new(&config, &mut engine, Shell::stdio()).run();
    let closed = engine.close();

    result.context("failed to talk to the terminal")?;
    closed.context("failed to close database connection")
}
