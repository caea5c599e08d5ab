//! `quest stats` -- per-day rollups for a user.

use anyhow::{Context, Result, bail};

use quest_storage::Storage;

use crate::cli::StatsArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

/// Execute the `quest stats` command.
pub fn run(ctx: &RuntimeContext, args: &StatsArgs) -> Result<()> {
    if args.days <= 0 {
        bail!("--days must be positive (got {})", args.days);
    }
    let store = ctx.open_store()?;

    // Confirms the user exists so an unknown id is an error, not an empty table.
    store
        .get_user(args.user)
        .with_context(|| format!("failed to load user {}", args.user))?;
    let stats = store
        .list_daily_stats(args.user, args.days)
        .with_context(|| format!("failed to load stats for user {}", args.user))?;

    if ctx.json {
        output_json(&stats);
        return Ok(());
    }
    if stats.is_empty() {
        if !ctx.quiet {
            println!("No activity recorded yet.");
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = stats
        .iter()
        .map(|s| {
            vec![
                s.stat_date.to_string(),
                s.tasks_completed.to_string(),
                s.study_minutes.to_string(),
                s.xp_earned.to_string(),
                if s.streak_active { "*" } else { "" }.to_string(),
            ]
        })
        .collect();
    output_table(&["DATE", "TASKS", "MINUTES", "XP", "STREAK"], &rows);

    if !ctx.quiet {
        let xp: i64 = stats.iter().map(|s| s.xp_earned).sum();
        let tasks: i64 = stats.iter().map(|s| s.tasks_completed).sum();
        println!();
        println!("{} tasks, {} XP over {} active days", tasks, xp, stats.len());
    }
    Ok(())
}
