//! `quest user` -- register, inspect, and remove users.

use anyhow::{Context, Result};

use quest_core::user::{NewUser, User};
use quest_storage::Storage;

use crate::cli::{UserArgs, UserCommands};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, short_time};
use crate::styles::{render_accent, render_bold, render_muted};

/// Execute the `quest user` command.
pub fn run(ctx: &RuntimeContext, args: &UserArgs) -> Result<()> {
    let store = ctx.open_store()?;

    match &args.command {
        UserCommands::Add(add) => {
            let user = store
                .create_user(&NewUser::new(add.name.as_str(), add.email.as_str()))
                .with_context(|| format!("failed to create user '{}'", add.name))?;

            if ctx.json {
                output_json(&user);
            } else if !ctx.quiet {
                println!("Created user {}: {} <{}>", user.id, user.name, user.email);
            }
        }

        UserCommands::Show(id) => {
            let user = store
                .get_user(id.id)
                .with_context(|| format!("failed to load user {}", id.id))?;
            if ctx.json {
                output_json(&user);
            } else {
                print_user(&user);
            }
        }

        UserCommands::List => {
            let users = store.list_users().context("failed to list users")?;
            if ctx.json {
                output_json(&users);
            } else if users.is_empty() {
                if !ctx.quiet {
                    println!("No users. Add one with `quest user add`.");
                }
            } else {
                let rows: Vec<Vec<String>> = users
                    .iter()
                    .map(|u| {
                        vec![
                            u.id.to_string(),
                            u.name.clone(),
                            u.email.clone(),
                            u.level.to_string(),
                            u.total_xp_earned.to_string(),
                            u.current_streak.to_string(),
                        ]
                    })
                    .collect();
                output_table(&["ID", "NAME", "EMAIL", "LEVEL", "XP", "STREAK"], &rows);
            }
        }

        UserCommands::Delete(id) => {
            let user = store
                .get_user(id.id)
                .with_context(|| format!("failed to load user {}", id.id))?;
            store
                .delete_user(id.id)
                .with_context(|| format!("failed to delete user {}", id.id))?;

            if ctx.json {
                output_json(&serde_json::json!({
                    "status": "deleted",
                    "user_id": user.id,
                }));
            } else if !ctx.quiet {
                println!("Deleted user {} ({})", user.id, user.name);
            }
        }
    }

    Ok(())
}

fn print_user(user: &User) {
    println!("{} {}", render_bold(&user.name), render_muted(&format!("<{}>", user.email)));
    println!("  ID:        {} ({})", user.id, user.uuid);
    println!("  Level:     {}", render_accent(&user.level.to_string()));
    println!(
        "  XP:        {} current, {} earned",
        user.current_xp, user.total_xp_earned
    );
    println!(
        "  Streak:    {} days (longest {})",
        user.current_streak, user.longest_streak
    );
    println!("  Completed: {} tasks", user.tasks_completed);
    println!("  Joined:    {}", short_time(&user.created_at));
}
