//! `quest` -- gamified productivity record CLI.
//!
//! Parses CLI arguments with clap, resolves the runtime context, and
//! dispatches to command handlers. Completions go through the engine; every
//! other command is plain entity CRUD or a read-only report.

mod cli;
mod commands;
mod context;
mod output;
mod styles;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Exit status after Ctrl+C: 128 + SIGINT, as shells report it.
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() {
    // An open transaction is rolled back by SQLite when the process dies.
    let _ = ctrlc::set_handler(|| std::process::exit(INTERRUPTED_EXIT_CODE));

    let cli = Cli::parse();

    init_logging(cli.global.verbose);

    let ctx = RuntimeContext::from_global_args(&cli.global);

    let result = match &cli.command {
        Some(Commands::Init(args)) => commands::init::run(&ctx, args),
        Some(Commands::User(args)) => commands::user::run(&ctx, args),
        Some(Commands::Task(args)) => commands::task::run(&ctx, args),
        Some(Commands::Session(args)) => commands::session::run(&ctx, args),
        Some(Commands::Badge(args)) => commands::badge::run(&ctx, args),
        Some(Commands::Stats(args)) => commands::stats::run(&ctx, args),
        Some(Commands::Log(args)) => commands::log::run(&ctx, args),
        Some(Commands::Summary(args)) => commands::summary::run(&ctx, args),
        Some(Commands::Tasks(args)) => commands::tasks::run(&ctx, args),
        Some(Commands::Settings(args)) => commands::settings::run(&ctx, args),
        Some(Commands::Completion(args)) => commands::completion::run(&ctx, args),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if ctx.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

/// `--verbose` forces debug output for the quest crates; otherwise `RUST_LOG`
/// decides, and nothing is logged when it is unset.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("quest=debug,quest_engine=debug,quest_storage=debug,quest_config=debug")
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => return,
        }
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupt_is_not_reported_as_success() {
        assert_ne!(INTERRUPTED_EXIT_CODE, 0);
        assert_eq!(INTERRUPTED_EXIT_CODE, 128 + 2);
    }
}
