//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the state a command handler needs: the
//! resolved `.quest/` directory, the loaded config, and the global flags.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use tracing::{debug, warn};

use quest_config::config::{QuestConfig, load_config};
use quest_config::quest_dir::{db_path, find_quest_dir};
use quest_storage::SqliteStore;

use crate::cli::GlobalArgs;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug)]
pub struct RuntimeContext {
    /// Explicit `--db` path, if given.
    pub db_path: Option<PathBuf>,

    /// The discovered `.quest/` directory.
    pub quest_dir: Option<PathBuf>,

    /// Layered config of `quest_dir`, or defaults when there is none.
    pub config: QuestConfig,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    ///
    /// An unreadable config is logged and replaced by defaults so that
    /// `quest init --force` can still repair it.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        let quest_dir = env::current_dir().ok().and_then(|cwd| find_quest_dir(&cwd));

        let config = match &quest_dir {
            Some(dir) => load_config(dir).unwrap_or_else(|e| {
                warn!(dir = %dir.display(), error = %e, "ignoring unreadable config");
                QuestConfig::default()
            }),
            None => QuestConfig::default(),
        };

        Self {
            db_path: global.db.as_ref().map(PathBuf::from),
            json: global.json || config.json,
            quest_dir,
            config,
            quiet: global.quiet,
        }
    }

    /// Returns the database path: `--db`, then the config's `db` (relative
    /// to `.quest/`), then `.quest/quest.db`.
    pub fn resolve_db_path(&self) -> Option<PathBuf> {
        if let Some(ref p) = self.db_path {
            return Some(p.clone());
        }
        let dir = self.quest_dir.as_ref()?;
        match &self.config.db {
            Some(custom) => Some(dir.join(custom)),
            None => Some(db_path(dir)),
        }
    }

    /// Opens the store, failing if no database has been initialized.
    pub fn open_store(&self) -> Result<SqliteStore> {
        let path = self
            .resolve_db_path()
            .context("no quest database found. Run 'quest init' to create one.")?;

        if !path.exists() {
            bail!(
                "no quest database found at {}\nHint: run 'quest init' to create a database",
                path.display()
            );
        }

        debug!(path = %path.display(), "opening store");
        SqliteStore::open(&path)
            .with_context(|| format!("failed to open database: {}", path.display()))
    }
}
