//! Menu-driven migration wizard.

pub mod shell;

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::config::Config;
use crate::engine::{MigrationEngine, StepMigration};
use crate::errors::{CoreError, CoreResult};
use crate::scaffold::MigrationPair;

pub use shell::{Shell, SHELL_PREFIX};

const MENU: &str = "Welcome to the postgres migrations wizard.
Choose an option below:
1. New Migration File
2. Migrate Up
3. Migrate Up (n) Steps
4. Migrate Down
5. Migrate Down (n) Steps
6. ReMigrate. Down -> Up
7. Force Version
=============================
0. Quit";

/// Actions reachable from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardCommand {
    NewMigrationFile,
    MigrateUp,
    MigrateUpN,
    MigrateDown,
    MigrateDownN,
    ReMigrate,
    ForceVersion,
}

/// A parsed menu selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Quit,
    Run(WizardCommand),
}

impl FromStr for MenuChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let command = match s {
            "0" => return Ok(MenuChoice::Quit),
            "1" => WizardCommand::NewMigrationFile,
            "2" => WizardCommand::MigrateUp,
            "3" => WizardCommand::MigrateUpN,
            "4" => WizardCommand::MigrateDown,
            "5" => WizardCommand::MigrateDownN,
            "6" => WizardCommand::ReMigrate,
            "7" => WizardCommand::ForceVersion,
            other => return Err(other.to_string()),
        };
        Ok(MenuChoice::Run(command))
    }
}

/// Whether the wizard should show the menu again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Wizard<'a, E: ?Sized, R, W> {
    migrations_dir: &'a str,
    engine: &'a mut E,
    shell: Shell<R, W>,
    clock: fn() -> i64,
}

fn unix_now() -> i64 {
    chrono::Utc::now().timestamp()
}

impl<'a, E, R, W> Wizard<'a, E, R, W>
where
    E: MigrationEngine + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(config: &'a Config, engine: &'a mut E, shell: Shell<R, W>) -> Self {
        Self {
            migrations_dir: &config.migrations_dir,
            engine,
            shell,
            clock: unix_now,
        }
    }

    /// Replace the timestamp source used for new migration files
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    /// Show the menu until the user quits or input runs out
    pub fn run(&mut self) -> io::Result<()> {
        while self.step()? == Flow::Continue {}
        Ok(())
    }

    /// Show the menu once and carry out the selected action.
    ///
    /// Action failures are printed, not returned; only terminal IO errors escape.
    pub fn step(&mut self) -> io::Result<Flow> {
        self.shell.prompt(MENU)?;
        let Some(option) = self.shell.read_line()? else {
            return Ok(Flow::Quit);
        };

        let command = match option.parse::<MenuChoice>() {
            Ok(MenuChoice::Quit) => return Ok(Flow::Quit),
            Ok(MenuChoice::Run(command)) => command,
            Err(option) => {
                self.shell.say(&format!("\nInvalid option \"{}\"", option))?;
                return Ok(Flow::Continue);
            }
        };

        tracing::debug!(?command, "running wizard command");
        if let Err(e) = self.dispatch(command) {
            tracing::debug!(?command, error = %e, "wizard command failed");
            self.shell.say(&e.to_string())?;
        }
        Ok(Flow::Continue)
    }

    fn dispatch(&mut self, command: WizardCommand) -> CoreResult<()> {
        match command {
            WizardCommand::NewMigrationFile => self.new_migration_file(),
            WizardCommand::MigrateUp => Ok(self.engine.up()?),
            WizardCommand::MigrateUpN => {
                match self.read_count("Enter number of steps to migrate up. Should be a +ve integer greater than 0:")? {
                    Some(n) => self.engine.up_n(n),
                    None => Ok(()),
                }
            }
            WizardCommand::MigrateDown => Ok(self.engine.down()?),
            WizardCommand::MigrateDownN => {
                match self.read_count("Enter number of steps to migrate down. Should be a +ve integer greater than 0:")? {
                    Some(n) => self.engine.down_n(n),
                    None => Ok(()),
                }
            }
            WizardCommand::ReMigrate => {
                self.engine.down_n(1)?;
                self.engine.up_n(1)
            }
            WizardCommand::ForceVersion => self.force_version(),
        }
    }

    fn new_migration_file(&mut self) -> CoreResult<()> {
        self.shell.prompt("Please enter a migration title")?;
        let Some(title) = self.shell.read_line()? else {
            self.shell.say("Errored")?;
            return Err(CoreError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "no migration title given",
            )));
        };

        let pair = MigrationPair::plan(self.migrations_dir, &title, (self.clock)());
        self.shell.say(&format!(
            "\n\nCreating:\nUP: {}\nDOWN: {}\n",
            pair.up_name(),
            pair.down_name()
        ))?;

        if let Err(e) = pair.create() {
            self.shell.say("Errored")?;
            return Err(e);
        }
        self.shell.say("Created\n")?;
        Ok(())
    }

    /// Ask for a step count. Unreadable or non-integer answers yield `None`.
    fn read_count(&mut self, prompt: &str) -> CoreResult<Option<i64>> {
        self.shell.prompt(prompt)?;
        Ok(match self.shell.read_line() {
            Ok(Some(line)) => line.parse().ok(),
            _ => None,
        })
    }

    fn force_version(&mut self) -> CoreResult<()> {
        self.shell.prompt("Enter the version to force:")?;
        let input = match self.shell.read_line() {
            Ok(Some(input)) => input,
            _ => {
                self.shell.say("Errored")?;
                return Ok(());
            }
        };

        let version = match input.parse::<i64>() {
            Ok(version) => version,
            Err(e) => {
                self.shell.say("Errored")?;
                return Err(CoreError::validation(format!(
                    "invalid version \"{}\": {}",
                    input, e
                )));
            }
        };

        if let Err(e) = self.engine.force(version) {
            self.shell.say("Errored")?;
            return Err(e.into());
        }
        self.shell.say(&format!("Forced Version: {}\n", version))?;
        Ok(())
    }
}
