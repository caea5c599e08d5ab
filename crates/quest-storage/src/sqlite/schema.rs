//! DDL statements and default rows for the SQLite schema.
//!
//! Timestamps are stored as TEXT in ISO 8601 format, calendar dates as
//! `YYYY-MM-DD` TEXT (SQLite has no native datetime type). Booleans are
//! stored as INTEGER (0/1). JSON blobs are TEXT.
//!
//! There are no triggers: every cascading update is applied by the
//! completion engine inside its own transaction.

/// Current schema version. Bumped whenever the DDL changes.
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Core DDL statements executed during `init_schema`.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    // -- Users ---------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid             TEXT NOT NULL UNIQUE,
        name             TEXT NOT NULL CHECK (length(trim(name)) > 0),
        email            TEXT NOT NULL UNIQUE,
        current_xp       INTEGER NOT NULL DEFAULT 0 CHECK (current_xp >= 0),
        level            INTEGER NOT NULL DEFAULT 1 CHECK (level >= 1),
        current_streak   INTEGER NOT NULL DEFAULT 0 CHECK (current_streak >= 0),
        longest_streak   INTEGER NOT NULL DEFAULT 0 CHECK (longest_streak >= current_streak),
        tasks_completed  INTEGER NOT NULL DEFAULT 0 CHECK (tasks_completed >= 0),
        total_xp_earned  INTEGER NOT NULL DEFAULT 0 CHECK (total_xp_earned >= 0),
        created_at       TEXT NOT NULL,
        updated_at       TEXT NOT NULL
    )
    "#,
    // -- Tasks ---------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS tasks (
        id            INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid          TEXT NOT NULL UNIQUE,
        user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title         TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 200),
        description   TEXT NOT NULL DEFAULT '',
        category      TEXT NOT NULL CHECK (category IN
                          ('STUDY', 'MATHEMATICS', 'HISTORY', 'SCIENCE',
                           'EXERCISE', 'SOCIAL', 'WORK', 'PERSONAL')),
        priority      TEXT NOT NULL DEFAULT 'MEDIUM' CHECK (priority IN ('LOW', 'MEDIUM', 'HIGH')),
        status        TEXT NOT NULL DEFAULT 'PENDING' CHECK (status IN
                          ('PENDING', 'IN_PROGRESS', 'COMPLETED', 'OVERDUE', 'CANCELLED')),
        due_date      TEXT NOT NULL,
        xp_reward     INTEGER NOT NULL DEFAULT 10 CHECK (xp_reward >= 0),
        completed_at  TEXT,
        created_at    TEXT NOT NULL,
        updated_at    TEXT NOT NULL,
        CHECK ((status = 'COMPLETED') = (completed_at IS NOT NULL))
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_tasks_user_status ON tasks(user_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_tasks_due_date ON tasks(due_date)",
    // -- Study sessions ------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS study_sessions (
        id                INTEGER PRIMARY KEY AUTOINCREMENT,
        uuid              TEXT NOT NULL UNIQUE,
        user_id           INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        subject           TEXT NOT NULL,
        description       TEXT NOT NULL DEFAULT '',
        scheduled_at      TEXT NOT NULL,
        duration_minutes  INTEGER NOT NULL CHECK (duration_minutes > 0),
        status            TEXT NOT NULL DEFAULT 'SCHEDULED' CHECK (status IN
                              ('SCHEDULED', 'IN_PROGRESS', 'COMPLETED', 'CANCELLED', 'MISSED')),
        xp_earned         INTEGER NOT NULL DEFAULT 0 CHECK (xp_earned >= 0),
        notes             TEXT NOT NULL DEFAULT '',
        completed_at      TEXT,
        created_at        TEXT NOT NULL,
        updated_at        TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user_status ON study_sessions(user_id, status)",
    // -- Badge catalog -------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS badges (
        id                    INTEGER PRIMARY KEY AUTOINCREMENT,
        badge_key             TEXT NOT NULL UNIQUE,
        name                  TEXT NOT NULL,
        description           TEXT NOT NULL DEFAULT '',
        icon_name             TEXT NOT NULL DEFAULT '',
        requirement_type      TEXT NOT NULL,
        requirement_value     INTEGER NOT NULL CHECK (requirement_value > 0),
        requirement_category  TEXT,
        xp_bonus              INTEGER NOT NULL DEFAULT 0 CHECK (xp_bonus >= 0),
        is_active             INTEGER NOT NULL DEFAULT 1,
        created_at            TEXT NOT NULL
    )
    "#,
    // -- Per-user badge progress ---------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS user_badges (
        user_id      INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        badge_id     INTEGER NOT NULL REFERENCES badges(id) ON DELETE CASCADE,
        progress     INTEGER NOT NULL DEFAULT 0 CHECK (progress >= 0),
        is_unlocked  INTEGER NOT NULL DEFAULT 0,
        unlocked_at  TEXT,
        PRIMARY KEY (user_id, badge_id)
    )
    "#,
    // -- Daily aggregates ----------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS daily_stats (
        user_id          INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        stat_date        TEXT NOT NULL,
        tasks_completed  INTEGER NOT NULL DEFAULT 0 CHECK (tasks_completed >= 0),
        xp_earned        INTEGER NOT NULL DEFAULT 0 CHECK (xp_earned >= 0),
        study_minutes    INTEGER NOT NULL DEFAULT 0 CHECK (study_minutes >= 0),
        streak_active    INTEGER NOT NULL DEFAULT 0,
        PRIMARY KEY (user_id, stat_date)
    )
    "#,
    // -- Activity log --------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS activity_log (
        id             INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id        INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        activity_type  TEXT NOT NULL,
        entity_type    TEXT NOT NULL,
        entity_id      INTEGER,
        description    TEXT NOT NULL,
        xp_change      INTEGER NOT NULL DEFAULT 0,
        metadata_json  TEXT,
        created_at     TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_activity_user_created ON activity_log(user_id, created_at)",
    // -- Settings ------------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS app_settings (
        setting_key    TEXT PRIMARY KEY,
        setting_value  TEXT NOT NULL,
        setting_type   TEXT NOT NULL DEFAULT 'STRING' CHECK (setting_type IN
                           ('STRING', 'INTEGER', 'BOOLEAN', 'JSON')),
        description    TEXT NOT NULL DEFAULT '',
        updated_at     TEXT NOT NULL
    )
    "#,
    // -- Metadata table ------------------------------------------------------
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT NOT NULL
    )
    "#,
    // -- Views ---------------------------------------------------------------
    r#"
    CREATE VIEW IF NOT EXISTS v_user_summary AS
    SELECT
        u.id AS user_id, u.name, u.email, u.level, u.current_xp, u.total_xp_earned,
        u.current_streak, u.longest_streak, u.tasks_completed,
        (SELECT COUNT(*) FROM tasks t
          WHERE t.user_id = u.id AND t.status IN ('PENDING', 'IN_PROGRESS', 'OVERDUE'))
            AS pending_tasks,
        (SELECT COUNT(*) FROM user_badges ub
          WHERE ub.user_id = u.id AND ub.is_unlocked = 1)
            AS badges_unlocked,
        (SELECT COALESCE(SUM(s.duration_minutes), 0) FROM study_sessions s
          WHERE s.user_id = u.id AND s.status = 'COMPLETED')
            AS total_study_minutes
    FROM users u
    "#,
    r#"
    CREATE VIEW IF NOT EXISTS v_tasks_enriched AS
    SELECT
        t.id, t.uuid, t.user_id, t.title, t.description, t.category, t.priority,
        t.status, t.due_date, t.xp_reward, t.completed_at, t.created_at, t.updated_at,
        CASE WHEN t.status NOT IN ('COMPLETED', 'CANCELLED') AND t.due_date < date('now')
             THEN 1 ELSE 0 END AS is_overdue,
        CAST(julianday(t.due_date) - julianday(date('now')) AS INTEGER) AS days_until_due
    FROM tasks t
    "#,
];

/// Default settings inserted on first init: `(key, value, type, description)`.
pub const DEFAULT_SETTINGS: &[(&str, &str, &str, &str)] = &[
    ("db_version", "1.0", "STRING", "Database schema version"),
    ("level_curve", "linear", "STRING", "Level curve: linear, geometric or table"),
    ("xp_per_level", "100", "INTEGER", "XP per level for the linear curve"),
    ("level_base_xp", "100", "INTEGER", "XP for level 2 on the geometric curve"),
    ("level_growth", "1.5", "STRING", "Per-level cost ratio on the geometric curve"),
    ("level_thresholds", "[]", "JSON", "Cumulative XP for levels 2, 3, ... on the table curve"),
    ("default_task_xp", "10", "INTEGER", "XP reward for tasks created without one"),
    ("session_xp_per_minute", "1", "INTEGER", "XP per minute of completed study"),
    ("theme_mode", "auto", "STRING", "UI theme preference"),
];
