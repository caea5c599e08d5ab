//! End-to-end CLI integration tests for the `quest` binary.
//!
//! Each test creates its own temporary directory, initializes a quest
//! project, and exercises the `quest` binary as a subprocess via `assert_cmd`.

use assert_cmd::Command;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a `Command` targeting the cargo-built `quest` binary.
fn quest() -> Command {
    let mut cmd = Command::cargo_bin("quest").unwrap();
    cmd.env_remove("QUEST_DIR")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Initialize a project with an empty badge catalog.
fn init_project() -> TempDir {
    init_with(&["init", "--quiet", "--no-badges"])
}

/// Initialize a project with the default badge catalog.
fn init_with_badges() -> TempDir {
    init_with(&["init", "--quiet"])
}

fn init_with(args: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    quest().args(args).current_dir(tmp.path()).assert().success();
    tmp
}

/// Run a command with `--json`, assert success, and parse stdout.
fn run_json(tmp: &TempDir, args: &[&str]) -> serde_json::Value {
    let mut full = args.to_vec();
    full.push("--json");
    let output = quest().args(&full).current_dir(tmp.path()).output().unwrap();
    assert!(
        output.status.success(),
        "{:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

/// Register a user and return their ID.
fn add_user(tmp: &TempDir, name: &str, email: &str) -> String {
    let json = run_json(tmp, &["user", "add", name, "--email", email]);
    json["id"].as_i64().unwrap().to_string()
}

/// Create a task and return its ID.
fn add_task(tmp: &TempDir, user: &str, title: &str, extra_args: &[&str]) -> String {
    let mut args = vec!["task", "add", user, title];
    args.extend_from_slice(extra_args);
    let json = run_json(tmp, &args);
    json["id"].as_i64().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Flow 1: init
// ---------------------------------------------------------------------------

#[test]
fn flow1_init_creates_layout() {
    let tmp = init_project();
    let quest_dir = tmp.path().join(".quest");
    assert!(quest_dir.join("quest.db").is_file());
    assert!(quest_dir.join("config.yaml").is_file());
    assert!(quest_dir.join(".gitignore").is_file());

    quest()
        .arg("init")
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));

    quest()
        .args(["init", "--force", "--quiet"])
        .current_dir(tmp.path())
        .assert()
        .success();
}

#[test]
fn flow1_init_seeds_catalog_unless_disabled() {
    let seeded = init_with_badges();
    let badges = run_json(&seeded, &["badge", "list"]);
    let keys: Vec<&str> = badges
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["badge_key"].as_str().unwrap())
        .collect();
    assert_eq!(keys.len(), 6);
    assert!(keys.contains(&"FIRST_TASK"));
    assert!(keys.contains(&"XP_1000"));

    let empty = init_project();
    let badges = run_json(&empty, &["badge", "list"]);
    assert!(badges.as_array().unwrap().is_empty());
}

#[test]
fn flow1_missing_database_is_an_error() {
    let tmp = TempDir::new().unwrap();
    quest()
        .args(["user", "list"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: no quest database found"));
}

#[test]
fn flow1_quest_dir_env_overrides_discovery() {
    let tmp = TempDir::new().unwrap();
    let store_dir = tmp.path().join("elsewhere");
    let work = tmp.path().join("work");
    std::fs::create_dir_all(&work).unwrap();

    quest()
        .args(["init", "--quiet", "--no-badges"])
        .env("QUEST_DIR", &store_dir)
        .current_dir(&work)
        .assert()
        .success();
    assert!(store_dir.join("quest.db").is_file());
    assert!(!work.join(".quest").exists());

    quest()
        .args(["user", "add", "Ada", "--email", "ada@example.com", "--quiet"])
        .env("QUEST_DIR", &store_dir)
        .current_dir(&work)
        .assert()
        .success();
    quest()
        .args(["user", "list"])
        .current_dir(&work)
        .assert()
        .failure();
}

#[test]
fn flow1_config_overrides_reach_settings() {
    let tmp = TempDir::new().unwrap();
    let quest_dir = tmp.path().join(".quest");
    std::fs::create_dir_all(&quest_dir).unwrap();
    std::fs::write(
        quest_dir.join("config.yaml"),
        "gamification:\n  default_task_xp: 25\n  xp_per_level: 50\n",
    )
    .unwrap();

    quest()
        .args(["init", "--quiet", "--no-badges"])
        .current_dir(tmp.path())
        .assert()
        .success();

    let setting = run_json(&tmp, &["settings", "get", "default_task_xp"]);
    assert_eq!(setting["value"], "25");

    let user = add_user(&tmp, "Ada", "ada@example.com");
    let task = run_json(&tmp, &["task", "add", &user, "Read chapter 1"]);
    assert_eq!(task["xp_reward"], 25);

    // 25 XP on a 50-XP-per-level curve stays at level 1; a second task levels up.
    let id = task["id"].as_i64().unwrap().to_string();
    let outcome = run_json(&tmp, &["task", "complete", &user, &id]);
    assert_eq!(outcome["new_level"], 1);
    let id2 = add_task(&tmp, &user, "Read chapter 2", &[]);
    let outcome = run_json(&tmp, &["task", "complete", &user, &id2]);
    assert_eq!(outcome["new_level"], 2);
    assert_eq!(outcome["leveled_up"], true);
}

// ---------------------------------------------------------------------------
// Flow 2: task completion
// ---------------------------------------------------------------------------

#[test]
fn flow2_complete_task_credits_everything() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let task = add_task(&tmp, &user, "Problem set 4", &["--xp", "20", "-c", "mathematics"]);

    let outcome = run_json(&tmp, &["task", "complete", &user, &task]);
    assert_eq!(outcome["xp_gained"], 20);
    assert_eq!(outcome["new_level"], 1);
    assert_eq!(outcome["leveled_up"], false);
    assert_eq!(outcome["new_streak"], 1);
    assert!(outcome["badges_unlocked"].as_array().unwrap().is_empty());

    let shown = run_json(&tmp, &["user", "show", &user]);
    assert_eq!(shown["current_xp"], 20);
    assert_eq!(shown["tasks_completed"], 1);
    assert_eq!(shown["current_streak"], 1);

    let task_json = run_json(&tmp, &["task", "show", &task]);
    assert_eq!(task_json["status"], "COMPLETED");
    assert!(task_json["completed_at"].is_string());

    let stats = run_json(&tmp, &["stats", &user]);
    let today = &stats.as_array().unwrap()[0];
    assert_eq!(today["tasks_completed"], 1);
    assert_eq!(today["xp_earned"], 20);

    let log = run_json(&tmp, &["log", &user]);
    let completed: Vec<&serde_json::Value> = log
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["activity_type"] == "TASK_COMPLETED")
        .collect();
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0]["xp_change"], 20);
}

#[test]
fn flow2_second_completion_is_rejected() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let task = add_task(&tmp, &user, "Essay draft", &["--xp", "15"]);

    run_json(&tmp, &["task", "complete", &user, &task]);
    let before = run_json(&tmp, &["user", "show", &user]);

    quest()
        .args(["task", "complete", user.as_str(), task.as_str()])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already completed"));

    quest()
        .args(["task", "complete", user.as_str(), task.as_str(), "--json"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"error\""));

    let after = run_json(&tmp, &["user", "show", &user]);
    assert_eq!(before, after);
}

#[test]
fn flow2_level_up_is_logged() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let task = add_task(&tmp, &user, "Capstone", &["--xp", "120"]);

    let outcome = run_json(&tmp, &["task", "complete", &user, &task]);
    assert_eq!(outcome["leveled_up"], true);
    assert_eq!(outcome["new_level"], 2);

    let log = run_json(&tmp, &["log", &user]);
    let types: Vec<&str> = log
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["activity_type"].as_str().unwrap())
        .collect();
    assert!(types.contains(&"LEVEL_UP"));
    assert!(types.contains(&"TASK_COMPLETED"));

    quest()
        .args(["summary", user.as_str()])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Level 2"));
}

#[test]
fn flow2_first_task_badge_unlocks() {
    let tmp = init_with_badges();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let task = add_task(&tmp, &user, "Warm-up", &["--xp", "20"]);

    let outcome = run_json(&tmp, &["task", "complete", &user, &task]);
    let unlocked = outcome["badges_unlocked"].as_array().unwrap();
    assert_eq!(unlocked.len(), 1);
    assert_eq!(unlocked[0]["badge_key"], "FIRST_TASK");
    assert_eq!(outcome["xp_gained"], 70);

    let progress = run_json(&tmp, &["badge", "progress", &user]);
    let first = progress
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["badge"]["badge_key"] == "FIRST_TASK")
        .unwrap();
    assert_eq!(first["is_unlocked"], true);
    assert_eq!(first["progress"], 1);

    let summary = run_json(&tmp, &["summary", &user]);
    assert_eq!(summary["summary"]["badges_unlocked"], 1);
    assert_eq!(summary["summary"]["total_xp_earned"], 70);
}

#[test]
fn flow2_other_users_task_is_not_found() {
    let tmp = init_project();
    let ada = add_user(&tmp, "Ada", "ada@example.com");
    let bob = add_user(&tmp, "Bob", "bob@example.com");
    let task = add_task(&tmp, &ada, "Ada's task", &[]);

    quest()
        .args(["task", "complete", bob.as_str(), task.as_str()])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    let task_json = run_json(&tmp, &["task", "show", &task]);
    assert_eq!(task_json["status"], "PENDING");
}

// ---------------------------------------------------------------------------
// Flow 3: task editing and views
// ---------------------------------------------------------------------------

#[test]
fn flow3_update_and_cancel() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let task = add_task(&tmp, &user, "Lab report", &[]);

    let updated = run_json(
        &tmp,
        &["task", "update", &task, "--title", "Lab report v2", "-p", "high"],
    );
    assert_eq!(updated["title"], "Lab report v2");
    assert_eq!(updated["priority"], "HIGH");

    quest()
        .args(["task", "update", task.as_str(), "--status", "completed"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("quest task complete"));

    run_json(&tmp, &["task", "update", &task, "--status", "cancelled"]);

    quest()
        .args(["task", "complete", user.as_str(), task.as_str()])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be completed from CANCELLED"));
}

#[test]
fn flow3_completed_task_is_kept() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let task = add_task(&tmp, &user, "Essay", &[]);
    run_json(&tmp, &["task", "complete", &user, &task]);

    quest()
        .args(["task", "delete", task.as_str()])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot move from COMPLETED to DELETED"));

    let shown = run_json(&tmp, &["task", "show", &task]);
    assert_eq!(shown["status"], "COMPLETED");
}

#[test]
fn flow3_list_filters_and_enriched_view() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    add_task(&tmp, &user, "Old essay", &["--due", "2000-01-01", "-c", "history"]);
    add_task(&tmp, &user, "Future essay", &["--due", "2999-01-01", "-c", "study"]);

    let history = run_json(&tmp, &["task", "list", &user, "--category", "HISTORY"]);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["title"], "Old essay");

    let enriched = run_json(&tmp, &["tasks", &user]);
    let rows = enriched.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let old = rows.iter().find(|t| t["title"] == "Old essay").unwrap();
    assert_eq!(old["is_overdue"], true);
    assert!(old["days_until_due"].as_i64().unwrap() < 0);
    let future = rows.iter().find(|t| t["title"] == "Future essay").unwrap();
    assert_eq!(future["is_overdue"], false);

    let overdue = run_json(&tmp, &["tasks", &user, "--overdue"]);
    assert_eq!(overdue.as_array().unwrap().len(), 1);

    quest()
        .args(["task", "add", user.as_str(), "Bad", "--category", "cooking"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid category 'cooking'"));
}

// ---------------------------------------------------------------------------
// Flow 4: sessions
// ---------------------------------------------------------------------------

#[test]
fn flow4_session_completion_counts_minutes() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let session = run_json(
        &tmp,
        &["session", "add", &user, "Calculus", "--minutes", "45"],
    );
    let id = session["id"].as_i64().unwrap().to_string();
    assert_eq!(session["status"], "SCHEDULED");

    let outcome = run_json(&tmp, &["session", "complete", &user, &id]);
    assert_eq!(outcome["xp_gained"], 45);
    assert_eq!(outcome["new_streak"], 1);

    let stats = run_json(&tmp, &["stats", &user, "--days", "1"]);
    assert_eq!(stats[0]["study_minutes"], 45);
    assert_eq!(stats[0]["tasks_completed"], 0);

    let sessions = run_json(&tmp, &["session", "list", &user]);
    assert_eq!(sessions[0]["status"], "COMPLETED");
    assert_eq!(sessions[0]["xp_earned"], 45);
}

#[test]
fn flow4_session_status_changes() {
    let tmp = init_project();
    let user = add_user(&tmp, "Ada", "ada@example.com");
    let session = run_json(
        &tmp,
        &[
            "session",
            "add",
            &user,
            "Physics",
            "--minutes",
            "30",
            "--at",
            "2026-03-01T18:00:00Z",
        ],
    );
    let id = session["id"].as_i64().unwrap().to_string();

    let missed = run_json(&tmp, &["session", "status", &id, "missed"]);
    assert_eq!(missed["status"], "MISSED");

    quest()
        .args(["session", "complete", user.as_str(), id.as_str()])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be completed from MISSED"));
}

// ---------------------------------------------------------------------------
// Flow 5: badges and settings
// ---------------------------------------------------------------------------

#[test]
fn flow5_custom_badge_lifecycle() {
    let tmp = init_project();
    run_json(
        &tmp,
        &[
            "badge",
            "add",
            "MATH_2",
            "Number Cruncher",
            "--type",
            "category_master",
            "--value",
            "2",
            "-c",
            "mathematics",
            "--bonus",
            "30",
        ],
    );

    let user = add_user(&tmp, "Ada", "ada@example.com");
    for title in ["Set 1", "Set 2"] {
        let task = add_task(&tmp, &user, title, &["-c", "MATHEMATICS", "--xp", "5"]);
        run_json(&tmp, &["task", "complete", &user, &task]);
    }
    let shown = run_json(&tmp, &["user", "show", &user]);
    assert_eq!(shown["total_xp_earned"], 40);

    let disabled = run_json(&tmp, &["badge", "disable", "MATH_2"]);
    assert_eq!(disabled["is_active"], false);
    let active = run_json(&tmp, &["badge", "list"]);
    assert!(active.as_array().unwrap().is_empty());
    let all = run_json(&tmp, &["badge", "list", "--all"]);
    assert_eq!(all.as_array().unwrap().len(), 1);
}

#[test]
fn flow5_settings_are_typed() {
    let tmp = init_project();

    quest()
        .args(["settings", "get", "xp_per_level"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout("100\n");

    quest()
        .args(["settings", "set", "xp_per_level", "lots"])
        .current_dir(tmp.path())
        .assert()
        .failure();

    run_json(&tmp, &["settings", "set", "theme_mode", "dark"]);
    run_json(&tmp, &["settings", "set", "weekly_goal", "5", "--type", "integer"]);
    let goal = run_json(&tmp, &["settings", "get", "weekly_goal"]);
    assert_eq!(goal["setting_type"], "INTEGER");

    quest()
        .args(["settings", "get", "nope"])
        .current_dir(tmp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

// ---------------------------------------------------------------------------
// Flow 6: users and misc
// ---------------------------------------------------------------------------

#[test]
fn flow6_user_crud() {
    let tmp = init_project();
    let ada = add_user(&tmp, "Ada", "ada@example.com");

    quest()
        .args(["user", "add", "Ada Again", "--email", "ada@example.com"])
        .current_dir(tmp.path())
        .assert()
        .failure();

    quest()
        .args(["user", "list"])
        .current_dir(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ada@example.com"));

    run_json(&tmp, &["user", "delete", &ada]);
    let users = run_json(&tmp, &["user", "list"]);
    assert!(users.as_array().unwrap().is_empty());
}

#[test]
fn flow6_completion_scripts() {
    quest()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("quest"));
}

#[test]
fn flow6_explicit_db_flag() {
    let tmp = TempDir::new().unwrap();
    let db = tmp.path().join("elsewhere.db");
    let db = db.to_str().unwrap();

    quest()
        .args(["init", "--quiet", "--no-badges", "--db", db])
        .current_dir(tmp.path())
        .assert()
        .success();
    assert!(tmp.path().join("elsewhere.db").is_file());

    quest()
        .args(["user", "add", "Ada", "--email", "ada@example.com", "--db", db])
        .current_dir(tmp.path())
        .assert()
        .success();
}
