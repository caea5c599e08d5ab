//! `quest session` -- study session scheduling and completion.

use anyhow::{Context, Result, bail};

use quest_core::enums::SessionStatus;
use quest_core::session::NewSession;
use quest_engine::Orchestrator;
use quest_storage::Storage;

use crate::cli::{SessionAddArgs, SessionArgs, SessionCommands, SessionStatusArgs};
use crate::commands::task::report_outcome;
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, parse_timestamp, parse_variant, short_time, truncate};
use crate::styles::render_session_status;

/// Execute the `quest session` command.
pub fn run(ctx: &RuntimeContext, args: &SessionArgs) -> Result<()> {
    let store = ctx.open_store()?;

    match &args.command {
        SessionCommands::Add(add) => run_add(ctx, &store, add),
        SessionCommands::List(user) => {
            let sessions = store
                .list_sessions(user.user)
                .with_context(|| format!("failed to list sessions for user {}", user.user))?;
            if ctx.json {
                output_json(&sessions);
            } else if sessions.is_empty() {
                if !ctx.quiet {
                    println!("No sessions found.");
                }
            } else {
                let rows: Vec<Vec<String>> = sessions
                    .iter()
                    .map(|s| {
                        vec![
                            s.id.to_string(),
                            truncate(&s.subject, 32),
                            short_time(&s.scheduled_at),
                            s.duration_minutes.to_string(),
                            s.status.to_string(),
                            s.xp_earned.to_string(),
                        ]
                    })
                    .collect();
                output_table(&["ID", "SUBJECT", "SCHEDULED", "MIN", "STATUS", "XP"], &rows);
            }
            Ok(())
        }
        SessionCommands::Complete(complete) => {
            let outcome =
                Orchestrator::new(&store).complete_session(complete.user, complete.id)?;
            report_outcome(ctx, "session", complete.id, &outcome);
            Ok(())
        }
        SessionCommands::Status(status) => run_status(ctx, &store, status),
    }
}

fn run_add(ctx: &RuntimeContext, store: &dyn Storage, args: &SessionAddArgs) -> Result<()> {
    let mut session = NewSession::new(args.user, args.subject.as_str(), args.minutes);
    if let Some(ref at) = args.at {
        session = session.scheduled_at(parse_timestamp(at)?);
    }
    if let Some(ref d) = args.description {
        session = session.description(d.as_str());
    }

    let created = store
        .create_session(&session)
        .with_context(|| format!("failed to create session '{}'", args.subject))?;

    if ctx.json {
        output_json(&created);
    } else if !ctx.quiet {
        println!(
            "Scheduled session {}: {} ({} min at {})",
            created.id,
            created.subject,
            created.duration_minutes,
            short_time(&created.scheduled_at)
        );
    }
    Ok(())
}

fn run_status(ctx: &RuntimeContext, store: &dyn Storage, args: &SessionStatusArgs) -> Result<()> {
    let status = parse_variant(
        &args.status,
        "status",
        SessionStatus::parse_builtin,
        SessionStatus::BUILTIN,
    )?;
    if status == SessionStatus::Completed {
        bail!(
            "use `quest session complete <user> {}` to complete a session",
            args.id
        );
    }

    let session = store
        .update_session_status(args.id, &status)
        .with_context(|| format!("failed to update session {}", args.id))?;

    if ctx.json {
        output_json(&session);
    } else if !ctx.quiet {
        println!(
            "Session {} is now {}",
            session.id,
            render_session_status(&session.status)
        );
    }
    Ok(())
}
