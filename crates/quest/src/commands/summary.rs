//! `quest summary` -- one user's headline numbers.

use std::collections::HashMap;

use anyhow::{Context, Result};

use quest_core::level::LevelCurve;
use quest_storage::Storage;

use crate::cli::SummaryArgs;
use crate::context::RuntimeContext;
use crate::output::output_json;
use crate::styles::{render_accent, render_bold, render_progress_bar};

/// Execute the `quest summary` command.
pub fn run(ctx: &RuntimeContext, args: &SummaryArgs) -> Result<()> {
    let store = ctx.open_store()?;

    let summary = store
        .get_user_summary(args.user)
        .with_context(|| format!("failed to load summary for user {}", args.user))?;

    let settings: HashMap<String, String> = store
        .list_settings()
        .context("failed to load settings")?
        .into_iter()
        .map(|s| (s.key, s.value))
        .collect();
    let curve = LevelCurve::from_settings(&settings).context("invalid level curve settings")?;
    let progress = curve.progress(summary.total_xp_earned);

    if ctx.json {
        output_json(&serde_json::json!({
            "summary": summary,
            "level_progress": progress,
        }));
        return Ok(());
    }

    println!("{}", render_bold(&summary.name));
    println!(
        "  Level {}  {} XP earned ({} current)",
        render_accent(&summary.level.to_string()),
        summary.total_xp_earned,
        summary.current_xp
    );
    match progress.xp_to_next {
        Some(to_next) => {
            let span = progress.xp_into_level + to_next;
            println!(
                "  {} {} XP to level {}",
                render_progress_bar(progress.xp_into_level, span, 20),
                to_next,
                progress.level + 1
            );
        }
        None => println!("  Top level reached"),
    }
    println!(
        "  Streak: {} days (longest {})",
        summary.current_streak, summary.longest_streak
    );
    println!(
        "  Tasks: {} completed, {} pending",
        summary.tasks_completed, summary.pending_tasks
    );
    println!("  Study: {} minutes", summary.total_study_minutes);
    println!("  Badges: {} unlocked", summary.badges_unlocked);
    Ok(())
}
