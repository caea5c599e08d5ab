//! Completion engine for the quest system.
//!
//! The [`Orchestrator`] turns a task or session completion into one atomic
//! update of XP, level, streak, badges, daily stats and the activity log.
//! Badge requirements are evaluated by pluggable [`ProgressRule`]s.

pub mod activity;
pub mod badges;
pub mod daily;
pub mod error;
pub mod orchestrator;

pub use badges::{BadgeEvaluator, ProgressRule};
pub use error::EngineError;
pub use orchestrator::{CompletionOutcome, Orchestrator};
