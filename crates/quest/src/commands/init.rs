//! `quest init` -- initialize a quest database in the current directory.

use std::env;
use std::fs;

use anyhow::{Context, Result, bail};
use tracing::info;

use quest_config::config::{CONFIG_FILE_NAME, QuestConfig, load_config, save_config};
use quest_config::quest_dir::{db_path, ensure_quest_dir};
use quest_storage::{SqliteStore, Storage};

use crate::cli::InitArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;

/// Default gitignore content for the `.quest` directory.
const GITIGNORE_CONTENT: &str = "# quest database files
*.db
*.db-journal
*.db-wal
*.db-shm
";

/// Execute the `quest init` command.
pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let quest_dir = ensure_quest_dir(&cwd).context("failed to create the .quest directory")?;

    // An existing config.yaml is kept; environment overrides apply either way.
    let config_path = quest_dir.join(CONFIG_FILE_NAME);
    let existing_config = config_path.exists();
    let config = load_config(&quest_dir)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    let db = match (&ctx.db_path, &config.db) {
        (Some(p), _) => p.clone(),
        (None, Some(custom)) => quest_dir.join(custom),
        (None, None) => db_path(&quest_dir),
    };

    if !args.force && db.exists() {
        bail!(
            "Found existing database at {}\n\n\
            This directory is already initialized.\n\n\
            Use --force to re-initialize (existing data is kept, settings are re-applied).",
            db.display()
        );
    }

    let gitignore_path = quest_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(&gitignore_path, GITIGNORE_CONTENT).with_context(|| {
            format!("failed to create .gitignore: {}", gitignore_path.display())
        })?;
    }

    if !existing_config {
        save_config(&quest_dir, &QuestConfig::default())
            .with_context(|| format!("failed to write {}", config_path.display()))?;
    }

    let store = SqliteStore::open(&db)
        .with_context(|| format!("failed to create database: {}", db.display()))?;

    for (key, value, setting_type) in config.gamification.settings() {
        store
            .set_setting(key, &value, &setting_type)
            .with_context(|| format!("failed to apply setting '{}'", key))?;
    }

    let seeded = if args.no_badges {
        0
    } else {
        store
            .seed_default_badges()
            .context("failed to seed the badge catalog")?
    };
    info!(db = %db.display(), seeded, "initialized quest database");

    if ctx.json {
        output_json(&serde_json::json!({
            "status": "initialized",
            "quest_dir": quest_dir.display().to_string(),
            "database": db.display().to_string(),
            "badges_seeded": seeded,
        }));
    } else if !ctx.quiet {
        println!();
        println!("quest initialized successfully!");
        println!();
        println!("  Database: {}", db.display());
        println!("  Config:   {}", config_path.display());
        if args.no_badges {
            println!("  Badges:   none (catalog left empty)");
        } else {
            println!("  Badges:   {} seeded", seeded);
        }
        println!();
        println!("Run `quest user add \"Ada\" --email ada@example.com` to get started.");
        println!();
    }

    Ok(())
}
