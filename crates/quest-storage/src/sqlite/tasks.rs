//! Task CRUD operations for [`SqliteStore`].

use chrono::Utc;
use rusqlite::{Connection, Row, params};

use quest_core::activity::NewActivity;
use quest_core::enums::{ActivityType, TaskCategory, TaskPriority, TaskStatus};
use quest_core::filter::TaskFilter;
use quest_core::setting::keys;
use quest_core::task::{NewTask, Task, TaskUpdates};
use quest_core::validation::{validate_new_task, validate_task};

use crate::error::{Result, StorageError};
use crate::sqlite::activity::insert_activity;
use crate::sqlite::settings::get_setting_i64_on_conn;
use crate::sqlite::store::SqliteStore;
use crate::sqlite::time::{format_date, format_datetime, get_date, get_datetime, get_opt_datetime};

/// All task columns in a deterministic order for SELECT queries.
pub(crate) const TASK_COLUMNS: &str = "id, uuid, user_id, title, description, category, \
     priority, status, due_date, xp_reward, completed_at, created_at, updated_at";

/// Fallback when the `default_task_xp` setting is missing.
const DEFAULT_TASK_XP: i64 = 10;

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

/// Deserialises a row into a [`Task`].
pub(crate) fn scan_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        uuid: row.get("uuid")?,
        user_id: row.get("user_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        category: TaskCategory::from(row.get::<_, String>("category")?),
        priority: TaskPriority::from(row.get::<_, String>("priority")?),
        status: TaskStatus::from(row.get::<_, String>("status")?),
        due_date: get_date(row, "due_date")?,
        xp_reward: row.get("xp_reward")?,
        completed_at: get_opt_datetime(row, "completed_at")?,
        created_at: get_datetime(row, "created_at")?,
        updated_at: get_datetime(row, "updated_at")?,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers (used by both SqliteStore and Transaction)
// ---------------------------------------------------------------------------

/// Inserts a task and records a TASK_CREATED entry.
pub(crate) fn insert_task(conn: &Connection, task: &NewTask) -> Result<Task> {
    validate_new_task(task)?;
    let xp_reward = match task.xp_reward {
        Some(xp) => xp,
        None => get_setting_i64_on_conn(conn, keys::DEFAULT_TASK_XP, DEFAULT_TASK_XP)?.max(0),
    };

    let now = Utc::now();
    let now_str = format_datetime(&now);
    conn.execute(
        "INSERT INTO tasks (uuid, user_id, title, description, category, priority, status,
                            due_date, xp_reward, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'PENDING', ?7, ?8, ?9, ?9)",
        params![
            uuid::Uuid::new_v4().to_string(),
            task.user_id,
            task.title.trim(),
            task.description,
            task.category.as_str(),
            task.priority.as_str(),
            format_date(task.due_date),
            xp_reward,
            now_str,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            StorageError::not_found("user", task.user_id)
        }
        other => StorageError::Query(other),
    })?;
    let id = conn.last_insert_rowid();

    insert_activity(
        conn,
        &NewActivity::new(
            task.user_id,
            ActivityType::TaskCreated,
            format!("Created task: {}", task.title.trim()),
        )
        .entity("task", id)
        .at(now),
    )?;

    get_task_on_conn(conn, id)
}

pub(crate) fn get_task_on_conn(conn: &Connection, id: i64) -> Result<Task> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1");
    conn.query_row(&sql, params![id], scan_task)
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => StorageError::not_found("task", id),
            other => StorageError::Query(other),
        })
}

pub(crate) fn list_tasks_on_conn(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut where_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(user_id) = filter.user_id {
        where_clauses.push(format!("user_id = ?{}", param_values.len() + 1));
        param_values.push(Box::new(user_id));
    }
    if let Some(ref status) = filter.status {
        where_clauses.push(format!("status = ?{}", param_values.len() + 1));
        param_values.push(Box::new(status.as_str().to_string()));
    }
    if let Some(ref category) = filter.category {
        where_clauses.push(format!("category = ?{}", param_values.len() + 1));
        param_values.push(Box::new(category.as_str().to_string()));
    }
    if let Some(ref priority) = filter.priority {
        where_clauses.push(format!("priority = ?{}", param_values.len() + 1));
        param_values.push(Box::new(priority.as_str().to_string()));
    }
    if let Some(after) = filter.due_after {
        where_clauses.push(format!("due_date >= ?{}", param_values.len() + 1));
        param_values.push(Box::new(format_date(after)));
    }
    if let Some(before) = filter.due_before {
        where_clauses.push(format!("due_date <= ?{}", param_values.len() + 1));
        param_values.push(Box::new(format_date(before)));
    }

    let mut sql = format!("SELECT {TASK_COLUMNS} FROM tasks");
    if !where_clauses.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&where_clauses.join(" AND "));
    }
    sql.push_str(" ORDER BY due_date, id");
    if let Some(limit) = filter.limit {
        sql.push_str(&format!(" LIMIT {}", limit.max(0)));
    }

    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(param_refs.as_slice(), scan_task)?;
    let mut tasks = Vec::new();
    for row in rows {
        tasks.push(row?);
    }
    Ok(tasks)
}

/// Applies partial updates. Status may move only between non-completed
/// states; completion goes through the engine.
pub(crate) fn update_task_on_conn(
    conn: &Connection,
    id: i64,
    updates: &TaskUpdates,
) -> Result<Task> {
    let current = get_task_on_conn(conn, id)?;
    if updates.is_empty() {
        return Ok(current);
    }

    if let Some(ref status) = updates.status {
        if *status == TaskStatus::Completed || current.status == TaskStatus::Completed {
            return Err(StorageError::invalid_transition(
                "task",
                id,
                current.status.as_str(),
                status.as_str(),
            ));
        }
    }

    // Validate the merged record before touching the row.
    let mut merged = current.clone();
    if let Some(ref title) = updates.title {
        merged.title = title.trim().to_owned();
    }
    if let Some(ref category) = updates.category {
        if !category.is_builtin() {
            return Err(StorageError::validation(format!(
                "invalid category: {category}"
            )));
        }
        merged.category = category.clone();
    }
    if let Some(ref priority) = updates.priority {
        if !priority.is_builtin() {
            return Err(StorageError::validation(format!(
                "invalid priority: {priority}"
            )));
        }
        merged.priority = priority.clone();
    }
    if let Some(ref status) = updates.status {
        merged.status = status.clone();
    }
    validate_task(&merged)?;

    let mut set_clauses: Vec<String> = Vec::new();
    let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    macro_rules! add_field {
        ($col:expr, $val:expr) => {
            set_clauses.push(format!("{} = ?{}", $col, param_values.len() + 1));
            param_values.push(Box::new($val));
        };
    }

    if updates.title.is_some() {
        add_field!("title", merged.title.clone());
    }
    if let Some(ref description) = updates.description {
        add_field!("description", description.clone());
    }
    if updates.category.is_some() {
        add_field!("category", merged.category.as_str().to_string());
    }
    if updates.priority.is_some() {
        add_field!("priority", merged.priority.as_str().to_string());
    }
    if let Some(due) = updates.due_date {
        add_field!("due_date", format_date(due));
    }
    if updates.status.is_some() {
        add_field!("status", merged.status.as_str().to_string());
    }
    add_field!("updated_at", format_datetime(&Utc::now()));

    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ?{}",
        set_clauses.join(", "),
        param_values.len() + 1
    );
    param_values.push(Box::new(id));
    let param_refs: Vec<&dyn rusqlite::types::ToSql> =
        param_values.iter().map(|p| p.as_ref()).collect();
    conn.execute(&sql, param_refs.as_slice())?;

    get_task_on_conn(conn, id)
}

/// Deletes an open or cancelled task after recording a TASK_DELETED entry.
///
/// Completed tasks stay: badge progress is recounted from their rows and
/// must keep agreeing with `users.tasks_completed`.
pub(crate) fn delete_task_on_conn(conn: &Connection, id: i64) -> Result<()> {
    let task = get_task_on_conn(conn, id)?;
    if task.status == TaskStatus::Completed {
        return Err(StorageError::invalid_transition(
            "task",
            id,
            task.status.as_str(),
            "DELETED",
        ));
    }
    insert_activity(
        conn,
        &NewActivity::new(
            task.user_id,
            ActivityType::TaskDeleted,
            format!("Deleted task: {}", task.title),
        )
        .entity("task", id),
    )?;
    conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
    Ok(())
}

/// Compare-and-swap transition to COMPLETED.
pub(crate) fn complete_task_if_open_on_conn(
    conn: &Connection,
    user_id: i64,
    task_id: i64,
    at: &str,
) -> Result<bool> {
    let affected = conn.execute(
        "UPDATE tasks SET status = 'COMPLETED', completed_at = ?1, updated_at = ?1
         WHERE id = ?2 AND user_id = ?3 AND status IN ('PENDING', 'IN_PROGRESS', 'OVERDUE')",
        params![at, task_id, user_id],
    )?;
    Ok(affected == 1)
}

pub(crate) fn count_completed_tasks_on_conn(
    conn: &Connection,
    user_id: i64,
    category: Option<&TaskCategory>,
) -> Result<i64> {
    let count = match category {
        Some(category) => conn.query_row(
            "SELECT COUNT(*) FROM tasks
             WHERE user_id = ?1 AND status = 'COMPLETED' AND category = ?2",
            params![user_id, category.as_str()],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?1 AND status = 'COMPLETED'",
            params![user_id],
            |row| row.get(0),
        )?,
    };
    Ok(count)
}

// ---------------------------------------------------------------------------
// SqliteStore task methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Creates a task and its TASK_CREATED entry atomically.
    pub fn create_task_impl(&self, task: &NewTask) -> Result<Task> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        let created = insert_task(&tx, task)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(created)
    }

    pub fn get_task_impl(&self, id: i64) -> Result<Task> {
        let conn = self.lock_conn()?;
        get_task_on_conn(&conn, id)
    }

    pub fn list_tasks_impl(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let conn = self.lock_conn()?;
        list_tasks_on_conn(&conn, filter)
    }

    pub fn update_task_impl(&self, id: i64, updates: &TaskUpdates) -> Result<Task> {
        let conn = self.lock_conn()?;
        update_task_on_conn(&conn, id, updates)
    }

    pub fn delete_task_impl(&self, id: i64) -> Result<()> {
        let conn = self.lock_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| StorageError::Transaction(format!("failed to begin: {e}")))?;
        delete_task_on_conn(&tx, id)?;
        tx.commit()
            .map_err(|e| StorageError::Transaction(format!("failed to commit: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use quest_core::task::TaskBuilder;
    use quest_core::user::NewUser;

    fn setup() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let user = store
            .create_user_impl(&NewUser::new("Ada", "ada@example.com"))
            .unwrap();
        (store, user.id)
    }

    #[test]
    fn create_and_get_task() {
        let (store, uid) = setup();
        let due = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let task = store
            .create_task_impl(
                &TaskBuilder::new(uid, "Read chapter 3")
                    .category(TaskCategory::Study)
                    .due_date(due)
                    .xp_reward(20)
                    .build(),
            )
            .unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.xp_reward, 20);
        assert_eq!(task.due_date, due);
        assert_eq!(task.completed_at, None);

        let got = store.get_task_impl(task.id).unwrap();
        assert_eq!(got, task);
    }

    #[test]
    fn default_reward_comes_from_settings() {
        let (store, uid) = setup();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Stretch").build())
            .unwrap();
        assert_eq!(task.xp_reward, 10);

        store
            .set_setting_impl(keys::DEFAULT_TASK_XP, "15", &quest_core::enums::SettingType::Integer)
            .unwrap();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Run").build())
            .unwrap();
        assert_eq!(task.xp_reward, 15);
    }

    #[test]
    fn create_records_activity() {
        let (store, uid) = setup();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Essay").build())
            .unwrap();
        let log = store.list_activity_impl(uid, 10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].activity_type, ActivityType::TaskCreated);
        assert_eq!(log[0].entity_id, Some(task.id));
        assert_eq!(log[0].xp_change, 0);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let (store, _) = setup();
        let err = store
            .create_task_impl(&TaskBuilder::new(999, "Orphan").build())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn update_cannot_complete() {
        let (store, uid) = setup();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Essay").build())
            .unwrap();
        let err = store
            .update_task_impl(
                task.id,
                &TaskUpdates {
                    status: Some(TaskStatus::Completed),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidTransition { .. }));
        assert_eq!(store.get_task_impl(task.id).unwrap().status, TaskStatus::Pending);
    }

    #[test]
    fn update_partial_fields() {
        let (store, uid) = setup();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Essay").build())
            .unwrap();
        let updated = store
            .update_task_impl(
                task.id,
                &TaskUpdates {
                    title: Some("Essay draft".into()),
                    priority: Some(TaskPriority::High),
                    status: Some(TaskStatus::Cancelled),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Essay draft");
        assert_eq!(updated.priority, TaskPriority::High);
        assert_eq!(updated.status, TaskStatus::Cancelled);
        assert_eq!(updated.category, task.category);
    }

    #[test]
    fn list_with_filters() {
        let (store, uid) = setup();
        store
            .create_task_impl(
                &TaskBuilder::new(uid, "Algebra")
                    .category(TaskCategory::Mathematics)
                    .build(),
            )
            .unwrap();
        store
            .create_task_impl(&TaskBuilder::new(uid, "Run").category(TaskCategory::Exercise).build())
            .unwrap();

        let all = store.list_tasks_impl(&TaskFilter::for_user(uid)).unwrap();
        assert_eq!(all.len(), 2);

        let math = store
            .list_tasks_impl(&TaskFilter {
                category: Some(TaskCategory::Mathematics),
                ..TaskFilter::for_user(uid)
            })
            .unwrap();
        assert_eq!(math.len(), 1);
        assert_eq!(math[0].title, "Algebra");
    }

    #[test]
    fn delete_records_activity() {
        let (store, uid) = setup();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Essay").build())
            .unwrap();
        store.delete_task_impl(task.id).unwrap();
        assert!(store.get_task_impl(task.id).unwrap_err().is_not_found());
        let log = store.list_activity_impl(uid, 10).unwrap();
        assert_eq!(log[0].activity_type, ActivityType::TaskDeleted);
    }

    #[test]
    fn completed_task_cannot_be_deleted() {
        let (store, uid) = setup();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Essay").build())
            .unwrap();
        {
            let conn = store.lock_conn().unwrap();
            let at = format_datetime(&Utc::now());
            assert!(complete_task_if_open_on_conn(&conn, uid, task.id, &at).unwrap());
        }
        let err = store.delete_task_impl(task.id).unwrap_err();
        assert!(matches!(err, StorageError::InvalidTransition { .. }), "{err}");
        assert_eq!(
            store.get_task_impl(task.id).unwrap().status,
            TaskStatus::Completed
        );
        let log = store.list_activity_impl(uid, 10).unwrap();
        assert!(log.iter().all(|a| a.activity_type != ActivityType::TaskDeleted));
    }

    #[test]
    fn cas_only_matches_open_tasks_of_owner() {
        let (store, uid) = setup();
        let task = store
            .create_task_impl(&TaskBuilder::new(uid, "Essay").build())
            .unwrap();
        let conn = store.lock_conn().unwrap();
        let at = format_datetime(&Utc::now());
        assert!(!complete_task_if_open_on_conn(&conn, uid + 1, task.id, &at).unwrap());
        assert!(complete_task_if_open_on_conn(&conn, uid, task.id, &at).unwrap());
        assert!(!complete_task_if_open_on_conn(&conn, uid, task.id, &at).unwrap());
        assert_eq!(count_completed_tasks_on_conn(&conn, uid, None).unwrap(), 1);
    }
}
