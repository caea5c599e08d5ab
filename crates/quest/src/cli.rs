//! Clap CLI definitions for the `quest` command.

use clap::{Args, Parser, Subcommand};

/// quest -- gamified productivity record.
///
/// Track tasks and study sessions, earn XP, level up, keep streaks alive,
/// and unlock badges.
#[derive(Parser, Debug)]
#[command(
    name = "quest",
    about = "Gamified productivity record",
    long_about = "Track tasks and study sessions, earn XP, level up, keep streaks alive, and unlock badges.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database path (default: discover .quest/quest.db).
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a quest database in the current directory.
    Init(InitArgs),

    // ===== Entities =====
    /// Manage users.
    User(UserArgs),

    /// Manage and complete tasks.
    Task(TaskArgs),

    /// Manage and complete study sessions.
    Session(SessionArgs),

    /// Manage the badge catalog and view progress.
    Badge(BadgeArgs),

    // ===== Reports =====
    /// Show daily stats for a user.
    Stats(StatsArgs),

    /// Show the activity log for a user.
    Log(LogArgs),

    /// Show a user's summary.
    Summary(SummaryArgs),

    /// List a user's tasks with overdue flags.
    Tasks(TasksArgs),

    // ===== Setup =====
    /// Read and write app settings.
    Settings(SettingsArgs),

    /// Generate shell completion scripts.
    Completion(CompletionArgs),
}

// ---------------------------------------------------------------------------
// init
// ---------------------------------------------------------------------------

/// Arguments for `quest init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Re-initialize even if a database already exists.
    #[arg(long)]
    pub force: bool,

    /// Do not seed the default badge catalog.
    #[arg(long)]
    pub no_badges: bool,
}

// ---------------------------------------------------------------------------
// user
// ---------------------------------------------------------------------------

/// Arguments for `quest user`.
#[derive(Args, Debug)]
pub struct UserArgs {
    #[command(subcommand)]
    pub command: UserCommands,
}

/// User subcommands.
#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a new user.
    Add(UserAddArgs),
    /// Show a user.
    Show(IdArg),
    /// List all users.
    List,
    /// Delete a user and everything they own.
    Delete(IdArg),
}

/// Arguments for `quest user add`.
#[derive(Args, Debug)]
pub struct UserAddArgs {
    /// Display name.
    pub name: String,

    /// Unique email address.
    #[arg(long)]
    pub email: String,
}

/// A single numeric ID.
#[derive(Args, Debug)]
pub struct IdArg {
    pub id: i64,
}

// ---------------------------------------------------------------------------
// task
// ---------------------------------------------------------------------------

/// Arguments for `quest task`.
#[derive(Args, Debug)]
pub struct TaskArgs {
    #[command(subcommand)]
    pub command: TaskCommands,
}

/// Task subcommands.
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Create a task.
    Add(TaskAddArgs),
    /// List a user's tasks.
    List(TaskListArgs),
    /// Show a task.
    Show(IdArg),
    /// Edit task fields.
    Update(TaskUpdateArgs),
    /// Delete a task.
    Delete(IdArg),
    /// Complete a task and credit XP, streak, and badges.
    #[command(alias = "done")]
    Complete(CompleteArgs),
}

/// Arguments for `quest task add`.
#[derive(Args, Debug)]
pub struct TaskAddArgs {
    /// Owning user ID.
    pub user: i64,

    /// Task title.
    pub title: String,

    /// Category (STUDY, MATHEMATICS, HISTORY, SCIENCE, EXERCISE, SOCIAL, WORK, PERSONAL).
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Priority (LOW, MEDIUM, HIGH).
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Due date (YYYY-MM-DD, default: today).
    #[arg(long)]
    pub due: Option<String>,

    /// XP reward (default: the default_task_xp setting).
    #[arg(long)]
    pub xp: Option<i64>,

    /// Longer description.
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

/// Arguments for `quest task list`.
#[derive(Args, Debug)]
pub struct TaskListArgs {
    /// Owning user ID.
    pub user: i64,

    /// Filter by status.
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by category.
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// Maximum number of tasks to show.
    #[arg(long, short = 'n')]
    pub limit: Option<i64>,
}

/// Arguments for `quest task update`.
#[derive(Args, Debug)]
pub struct TaskUpdateArgs {
    /// Task ID.
    pub id: i64,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long, short = 'c')]
    pub category: Option<String>,

    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Due date (YYYY-MM-DD).
    #[arg(long)]
    pub due: Option<String>,

    /// New status (PENDING, IN_PROGRESS, OVERDUE, CANCELLED).
    #[arg(long, short = 's')]
    pub status: Option<String>,
}

/// Arguments for `quest task complete` and `quest session complete`.
#[derive(Args, Debug)]
pub struct CompleteArgs {
    /// User ID the completion is credited to.
    pub user: i64,

    /// Task or session ID.
    pub id: i64,
}

// ---------------------------------------------------------------------------
// session
// ---------------------------------------------------------------------------

/// Arguments for `quest session`.
#[derive(Args, Debug)]
pub struct SessionArgs {
    #[command(subcommand)]
    pub command: SessionCommands,
}

/// Session subcommands.
#[derive(Subcommand, Debug)]
pub enum SessionCommands {
    /// Schedule a study session.
    Add(SessionAddArgs),
    /// List a user's sessions.
    List(UserArg),
    /// Complete a session and credit XP, streak, and badges.
    #[command(alias = "done")]
    Complete(CompleteArgs),
    /// Change a session's status (SCHEDULED, IN_PROGRESS, CANCELLED, MISSED).
    Status(SessionStatusArgs),
}

/// Arguments for `quest session add`.
#[derive(Args, Debug)]
pub struct SessionAddArgs {
    /// Owning user ID.
    pub user: i64,

    /// Subject studied.
    pub subject: String,

    /// Scheduled start (RFC 3339, default: now).
    #[arg(long)]
    pub at: Option<String>,

    /// Planned duration in minutes.
    #[arg(long, short = 'm')]
    pub minutes: i64,

    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

/// Arguments for `quest session status`.
#[derive(Args, Debug)]
pub struct SessionStatusArgs {
    /// Session ID.
    pub id: i64,

    /// New status.
    pub status: String,
}

/// A single user ID.
#[derive(Args, Debug)]
pub struct UserArg {
    pub user: i64,
}

// ---------------------------------------------------------------------------
// badge
// ---------------------------------------------------------------------------

/// Arguments for `quest badge`.
#[derive(Args, Debug)]
pub struct BadgeArgs {
    #[command(subcommand)]
    pub command: BadgeCommands,
}

/// Badge subcommands.
#[derive(Subcommand, Debug)]
pub enum BadgeCommands {
    /// List the badge catalog.
    List(BadgeListArgs),
    /// Show a user's progress toward every badge.
    Progress(UserArg),
    /// Add a badge to the catalog.
    Add(BadgeAddArgs),
    /// Re-activate a badge.
    Enable(BadgeKeyArg),
    /// Deactivate a badge; progress is kept.
    Disable(BadgeKeyArg),
}

/// Arguments for `quest badge list`.
#[derive(Args, Debug)]
pub struct BadgeListArgs {
    /// Include inactive badges.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `quest badge add`.
#[derive(Args, Debug)]
pub struct BadgeAddArgs {
    /// Unique badge key (e.g. TASK_25).
    pub key: String,

    /// Display name.
    pub name: String,

    /// Requirement type (TASK_COUNT, STREAK, XP_MILESTONE, CATEGORY_MASTER,
    /// SESSION_COUNT, STUDY_MINUTES, or a custom type).
    #[arg(long = "type", short = 't')]
    pub requirement_type: String,

    /// Threshold to unlock.
    #[arg(long)]
    pub value: i64,

    /// Category counted by CATEGORY_MASTER badges.
    #[arg(long, short = 'c')]
    pub category: Option<String>,

    /// XP credited on unlock.
    #[arg(long, default_value_t = 0)]
    pub bonus: i64,

    #[arg(long, short = 'd')]
    pub description: Option<String>,

    #[arg(long)]
    pub icon: Option<String>,
}

/// A single badge key.
#[derive(Args, Debug)]
pub struct BadgeKeyArg {
    pub key: String,
}

// ---------------------------------------------------------------------------
// reports
// ---------------------------------------------------------------------------

/// Arguments for `quest stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    pub user: i64,

    /// Number of most recent days to show.
    #[arg(long, default_value_t = 7)]
    pub days: i64,
}

/// Arguments for `quest log`.
#[derive(Args, Debug)]
pub struct LogArgs {
    pub user: i64,

    /// Maximum number of entries to show.
    #[arg(long, short = 'n', default_value_t = 20)]
    pub limit: i64,
}

/// Arguments for `quest summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    pub user: i64,
}

/// Arguments for `quest tasks`.
#[derive(Args, Debug)]
pub struct TasksArgs {
    pub user: i64,

    /// Only show overdue tasks.
    #[arg(long)]
    pub overdue: bool,
}

// ---------------------------------------------------------------------------
// settings
// ---------------------------------------------------------------------------

/// Arguments for `quest settings`.
#[derive(Args, Debug)]
pub struct SettingsArgs {
    #[command(subcommand)]
    pub command: SettingsCommands,
}

/// Settings subcommands.
#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// List every setting.
    List,
    /// Show one setting.
    Get(SettingsGetArgs),
    /// Create or change a setting.
    Set(SettingsSetArgs),
}

/// Arguments for `quest settings get`.
#[derive(Args, Debug)]
pub struct SettingsGetArgs {
    pub key: String,
}

/// Arguments for `quest settings set`.
#[derive(Args, Debug)]
pub struct SettingsSetArgs {
    pub key: String,

    pub value: String,

    /// Value type (STRING, INTEGER, BOOLEAN, JSON; default: keep the current type).
    #[arg(long = "type", short = 't')]
    pub setting_type: Option<String>,
}

// ---------------------------------------------------------------------------
// completion
// ---------------------------------------------------------------------------

/// Arguments for `quest completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Shells that completions can be generated for.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    Bash,
    Zsh,
    Fish,
    Powershell,
}
