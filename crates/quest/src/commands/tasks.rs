//! `quest tasks` -- a user's tasks with computed due-date flags.

use anyhow::{Context, Result};

use quest_storage::Storage;

use crate::cli::TasksArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, truncate};

/// Execute the `quest tasks` command.
pub fn run(ctx: &RuntimeContext, args: &TasksArgs) -> Result<()> {
    let store = ctx.open_store()?;

    let mut tasks = store
        .list_enriched_tasks(args.user)
        .with_context(|| format!("failed to load tasks for user {}", args.user))?;
    if args.overdue {
        tasks.retain(|t| t.is_overdue);
    }

    if ctx.json {
        output_json(&tasks);
        return Ok(());
    }
    if tasks.is_empty() {
        if !ctx.quiet {
            println!("No tasks found.");
        }
        return Ok(());
    }

    let rows: Vec<Vec<String>> = tasks
        .iter()
        .map(|t| {
            let due = match t.days_until_due {
                _ if !t.task.status.is_open() => String::new(),
                0 => "today".to_string(),
                1 => "tomorrow".to_string(),
                d if d > 1 => format!("in {d} days"),
                d => format!("{} days late", -d),
            };
            vec![
                t.task.id.to_string(),
                truncate(&t.task.title, 40),
                t.task.status.to_string(),
                t.task.due_date.to_string(),
                due,
                if t.is_overdue { "!" } else { "" }.to_string(),
            ]
        })
        .collect();
    output_table(&["ID", "TITLE", "STATUS", "DUE", "WHEN", "OVERDUE"], &rows);
    Ok(())
}
