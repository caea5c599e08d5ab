//! Discovery and management of the `.quest/` directory.
//!
//! The `.quest/` directory holds the database and `config.yaml`. It is found
//! by walking up from the working directory, unless `QUEST_DIR` points
//! somewhere else.

use std::path::{Path, PathBuf};

use crate::config::ConfigError;

/// The name of the quest metadata directory.
pub const QUEST_DIR_NAME: &str = ".quest";

/// The environment variable that overrides directory discovery.
pub const QUEST_DIR_ENV: &str = "QUEST_DIR";

/// The database file name inside `.quest/`.
pub const DB_FILE_NAME: &str = "quest.db";

/// Walk up the directory tree from `start` looking for a `.quest/` directory.
///
/// The `QUEST_DIR` environment variable is checked first. Returns `None`
/// when the filesystem root is reached without a match.
pub fn find_quest_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(QUEST_DIR_ENV) {
        let env_path = PathBuf::from(&env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }
    find_quest_dir_from(start)
}

/// Walk-up search without the environment override.
pub fn find_quest_dir_from(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().ok()?;
    let mut current = start.as_path();
    loop {
        let candidate = current.join(QUEST_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => return None,
        }
    }
}

/// Creates the `.quest/` directory `quest init` writes into: `QUEST_DIR`
/// when set, otherwise `cwd/.quest`.
pub fn ensure_quest_dir(cwd: &Path) -> Result<PathBuf, ConfigError> {
    let quest_dir = match std::env::var(QUEST_DIR_ENV) {
        Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
        _ => cwd.join(QUEST_DIR_NAME),
    };
    std::fs::create_dir_all(&quest_dir)?;
    Ok(quest_dir)
}

/// The database path inside a `.quest/` directory.
pub fn db_path(quest_dir: &Path) -> PathBuf {
    quest_dir.join(DB_FILE_NAME)
}
