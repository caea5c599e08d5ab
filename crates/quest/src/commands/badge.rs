//! `quest badge` -- catalog management and per-user progress.

use anyhow::{Context, Result};

use quest_core::badge::NewBadge;
use quest_core::enums::RequirementType;
use quest_storage::Storage;

use crate::cli::{BadgeAddArgs, BadgeArgs, BadgeCommands};
use crate::commands::task::parse_category;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, short_time};
use crate::styles::{render_badge, render_muted, render_progress_bar};

/// Execute the `quest badge` command.
pub fn run(ctx: &RuntimeContext, args: &BadgeArgs) -> Result<()> {
    let store = ctx.open_store()?;

    match &args.command {
        BadgeCommands::List(list) => {
            let badges = store
                .list_badges(!list.all)
                .context("failed to list badges")?;
            if ctx.json {
                output_json(&badges);
            } else if badges.is_empty() {
                if !ctx.quiet {
                    println!("The badge catalog is empty.");
                }
            } else {
                let rows: Vec<Vec<String>> = badges
                    .iter()
                    .map(|b| {
                        let requirement = match &b.requirement_category {
                            Some(c) => format!("{} {} ({})", b.requirement_type, b.requirement_value, c),
                            None => format!("{} {}", b.requirement_type, b.requirement_value),
                        };
                        vec![
                            b.badge_key.clone(),
                            b.name.clone(),
                            requirement,
                            b.xp_bonus.to_string(),
                            if b.is_active { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                output_table(&["KEY", "NAME", "REQUIREMENT", "BONUS", "ACTIVE"], &rows);
            }
        }

        BadgeCommands::Progress(user) => {
            let progress = store
                .list_user_badges(user.user)
                .with_context(|| format!("failed to load badges for user {}", user.user))?;
            if ctx.json {
                output_json(&progress);
            } else if progress.is_empty() {
                if !ctx.quiet {
                    println!("No badges to show.");
                }
            } else {
                for entry in &progress {
                    let badge = &entry.badge;
                    let bar = render_progress_bar(entry.progress, badge.requirement_value, 20);
                    let status = match entry.unlocked_at {
                        Some(ref at) if entry.is_unlocked => format!("unlocked {}", short_time(at)),
                        _ => format!("{}/{}", entry.progress, badge.requirement_value),
                    };
                    let name = if entry.is_unlocked {
                        render_badge(&badge.name)
                    } else {
                        render_muted(&badge.name)
                    };
                    println!("{} {} {}", bar, name, status);
                }
            }
        }

        BadgeCommands::Add(add) => run_add(ctx, &store, add)?,

        BadgeCommands::Enable(key) | BadgeCommands::Disable(key) => {
            let active = matches!(args.command, BadgeCommands::Enable(_));
            let badge = store
                .set_badge_active(&key.key, active)
                .with_context(|| format!("failed to update badge '{}'", key.key))?;
            if ctx.json {
                output_json(&badge);
            } else if !ctx.quiet {
                let verb = if active { "Enabled" } else { "Disabled" };
                println!("{} badge {} ({})", verb, badge.badge_key, badge.name);
            }
        }
    }

    Ok(())
}

fn run_add(ctx: &RuntimeContext, store: &dyn Storage, args: &BadgeAddArgs) -> Result<()> {
    let requirement_type = RequirementType::parse_builtin(&args.requirement_type)
        .unwrap_or_else(|| RequirementType::Custom(args.requirement_type.trim().to_string()));

    let mut badge = NewBadge::new(
        args.key.as_str(),
        args.name.as_str(),
        requirement_type,
        args.value,
    )
    .xp_bonus(args.bonus);
    if let Some(ref c) = args.category {
        badge = badge.category(parse_category(c)?);
    }
    if let Some(ref d) = args.description {
        badge = badge.description(d.as_str());
    }
    if let Some(ref icon) = args.icon {
        badge = badge.icon(icon.as_str());
    }

    let created = store
        .create_badge(&badge)
        .with_context(|| format!("failed to add badge '{}'", args.key))?;

    if ctx.json {
        output_json(&created);
    } else if !ctx.quiet {
        println!(
            "Added badge {} ({}): {} {}",
            created.badge_key, created.name, created.requirement_type, created.requirement_value
        );
        if !created.requirement_type.is_builtin() {
            println!(
                "  {}",
                render_muted("custom requirement types are not evaluated by the built-in rules")
            );
        }
    }
    Ok(())
}
