//! `quest task` -- task CRUD and completion.

use anyhow::{Context, Result, bail};

use quest_core::enums::{TaskCategory, TaskPriority, TaskStatus};
use quest_core::filter::TaskFilter;
use quest_core::task::{Task, TaskBuilder, TaskUpdates};
use quest_engine::{CompletionOutcome, Orchestrator};
use quest_storage::Storage;

use crate::cli::{TaskAddArgs, TaskArgs, TaskCommands, TaskListArgs, TaskUpdateArgs};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, parse_date, parse_variant, short_time, truncate};
use crate::styles::{render_accent, render_badge, render_bold, render_muted, render_task_status, render_xp};

/// Execute the `quest task` command.
pub fn run(ctx: &RuntimeContext, args: &TaskArgs) -> Result<()> {
    let store = ctx.open_store()?;

    match &args.command {
        TaskCommands::Add(add) => run_add(ctx, &store, add),
        TaskCommands::List(list) => run_list(ctx, &store, list),
        TaskCommands::Show(id) => {
            let task = store
                .get_task(id.id)
                .with_context(|| format!("failed to load task {}", id.id))?;
            if ctx.json {
                output_json(&task);
            } else {
                print_task(&task);
            }
            Ok(())
        }
        TaskCommands::Update(update) => run_update(ctx, &store, update),
        TaskCommands::Delete(id) => {
            store
                .delete_task(id.id)
                .with_context(|| format!("failed to delete task {}", id.id))?;
            if ctx.json {
                output_json(&serde_json::json!({
                    "status": "deleted",
                    "task_id": id.id,
                }));
            } else if !ctx.quiet {
                println!("Deleted task {}", id.id);
            }
            Ok(())
        }
        TaskCommands::Complete(complete) => {
            let outcome = Orchestrator::new(&store).complete_task(complete.user, complete.id)?;
            report_outcome(ctx, "task", complete.id, &outcome);
            Ok(())
        }
    }
}

pub(crate) fn parse_category(value: &str) -> Result<TaskCategory> {
    parse_variant(
        value,
        "category",
        TaskCategory::parse_builtin,
        TaskCategory::BUILTIN,
    )
}

fn parse_priority(value: &str) -> Result<TaskPriority> {
    parse_variant(
        value,
        "priority",
        TaskPriority::parse_builtin,
        TaskPriority::BUILTIN,
    )
}

fn parse_status(value: &str) -> Result<TaskStatus> {
    parse_variant(value, "status", TaskStatus::parse_builtin, TaskStatus::BUILTIN)
}

fn run_add(ctx: &RuntimeContext, store: &dyn Storage, args: &TaskAddArgs) -> Result<()> {
    let mut builder = TaskBuilder::new(args.user, args.title.as_str());
    if let Some(ref c) = args.category {
        builder = builder.category(parse_category(c)?);
    }
    if let Some(ref p) = args.priority {
        builder = builder.priority(parse_priority(p)?);
    }
    if let Some(ref due) = args.due {
        builder = builder.due_date(parse_date(due)?);
    }
    if let Some(xp) = args.xp {
        builder = builder.xp_reward(xp);
    }
    if let Some(ref d) = args.description {
        builder = builder.description(d.as_str());
    }

    let task = store
        .create_task(&builder.build())
        .with_context(|| format!("failed to create task '{}'", args.title))?;

    if ctx.json {
        output_json(&task);
    } else if !ctx.quiet {
        println!(
            "Created task {}: {} ({}, due {})",
            task.id,
            task.title,
            render_xp(task.xp_reward),
            task.due_date
        );
    }
    Ok(())
}

fn run_list(ctx: &RuntimeContext, store: &dyn Storage, args: &TaskListArgs) -> Result<()> {
    let mut filter = TaskFilter::for_user(args.user);
    if let Some(ref s) = args.status {
        filter.status = Some(parse_status(s)?);
    }
    if let Some(ref c) = args.category {
        filter.category = Some(parse_category(c)?);
    }
    filter.limit = args.limit;

    let tasks = store.list_tasks(&filter).context("failed to list tasks")?;

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
            vec![
                t.id.to_string(),
                truncate(&t.title, 40),
                t.category.to_string(),
                t.priority.to_string(),
                t.status.to_string(),
                t.due_date.to_string(),
                t.xp_reward.to_string(),
            ]
        })
        .collect();
    output_table(
        &["ID", "TITLE", "CATEGORY", "PRIORITY", "STATUS", "DUE", "XP"],
        &rows,
    );
    Ok(())
}

fn run_update(ctx: &RuntimeContext, store: &dyn Storage, args: &TaskUpdateArgs) -> Result<()> {
    let mut updates = TaskUpdates {
        title: args.title.clone(),
        description: args.description.clone(),
        ..Default::default()
    };
    if let Some(ref c) = args.category {
        updates.category = Some(parse_category(c)?);
    }
    if let Some(ref p) = args.priority {
        updates.priority = Some(parse_priority(p)?);
    }
    if let Some(ref due) = args.due {
        updates.due_date = Some(parse_date(due)?);
    }
    if let Some(ref s) = args.status {
        let status = parse_status(s)?;
        if status == TaskStatus::Completed {
            bail!(
                "use `quest task complete <user> {}` to complete a task",
                args.id
            );
        }
        updates.status = Some(status);
    }
    if updates.is_empty() {
        bail!("nothing to update (pass at least one field flag)");
    }

    let task = store
        .update_task(args.id, &updates)
        .with_context(|| format!("failed to update task {}", args.id))?;

    if ctx.json {
        output_json(&task);
    } else if !ctx.quiet {
        println!("Updated task {}: {}", task.id, task.title);
    }
    Ok(())
}

fn print_task(task: &Task) {
    println!("{} {}", render_bold(&task.title), render_muted(&format!("#{}", task.id)));
    println!("  Status:    {}", render_task_status(&task.status));
    println!("  Category:  {}", task.category);
    println!("  Priority:  {}", task.priority);
    println!("  Due:       {}", task.due_date);
    println!("  Reward:    {}", render_xp(task.xp_reward));
    println!("  Owner:     user {}", task.user_id);
    if let Some(ref at) = task.completed_at {
        println!("  Completed: {}", short_time(at));
    }
    if !task.description.is_empty() {
        println!();
        println!("  {}", task.description);
    }
}

/// Prints the result of a completion in the current output mode.
pub(crate) fn report_outcome(
    ctx: &RuntimeContext,
    entity: &str,
    id: i64,
    outcome: &CompletionOutcome,
) {
    if ctx.json {
        output_json(outcome);
        return;
    }
    if ctx.quiet {
        return;
    }

    println!("Completed {} {}: {}", entity, id, render_xp(outcome.xp_gained));
    if outcome.leveled_up {
        println!(
            "  Level up! Now level {}",
            render_accent(&outcome.new_level.to_string())
        );
    }
    for badge in &outcome.badges_unlocked {
        println!(
            "  Badge unlocked: {} {}",
            render_badge(&badge.name),
            render_xp(badge.xp_bonus)
        );
    }
    println!("  Streak: {} days", outcome.new_streak);
}
