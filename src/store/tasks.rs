//! Task repository over the `tasks` table.

use anyhow::{Context, Result};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::ids::{self, IdKind};
use super::notes::find_notes_by_task;
use super::types::{NewTask, Task, TaskFilter, TaskPatch, WorkStatus};

const TASK_COLUMNS: &str = "task_id, agent_id, title, description, status, created_at, updated_at";

/// Insert a task, allocating a `session_YYYYMMDD_NNN` id unless one is given.
pub fn create_task(conn: &mut Connection, new: &NewTask) -> Result<Task> {
    if let Some(id) = &new.task_id {
        ids::validate_id(IdKind::Task, id)?;
    }

    let tx = conn.transaction()?;
    let task_id = match &new.task_id {
        Some(id) => id.clone(),
        None => ids::next_id(&tx, IdKind::Task, ids::today())?,
    };
    let now = chrono::Utc::now().to_rfc3339();

    tx.execute(
        "INSERT INTO tasks (task_id, agent_id, title, description, status, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
        params![
            task_id,
            new.agent_id,
            new.title,
            new.description,
            new.status.as_str(),
            now,
        ],
    )
    .with_context(|| format!("failed to insert task {task_id}"))?;
    tx.commit()?;

    tracing::info!(task_id = %task_id, agent_id = %new.agent_id, "task created");

    Ok(Task {
        task_id,
        agent_id: new.agent_id.clone(),
        title: new.title.clone(),
        description: new.description.clone(),
        created_at: now.clone(),
        updated_at: now,
        status: new.status,
        notes: None,
    })
}

/// Find a task by id. When `agent_id` is given, the task must also belong to that agent.
pub fn find_task(conn: &Connection, task_id: &str, agent_id: Option<&str>) -> Result<Option<Task>> {
    let task = match agent_id {
        Some(agent) => conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?1 AND agent_id = ?2"),
                params![task_id, agent],
                row_to_task,
            )
            .optional()?,
        None => conn
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE task_id = ?1"),
                params![task_id],
                row_to_task,
            )
            .optional()?,
    };
    Ok(task)
}

/// Like [`find_task`], with the task's notes (newest first) attached.
pub fn find_task_with_notes(
    conn: &Connection,
    task_id: &str,
    agent_id: Option<&str>,
) -> Result<Option<Task>> {
    let Some(mut task) = find_task(conn, task_id, agent_id)? else {
        return Ok(None);
    };
    task.notes = Some(find_notes_by_task(conn, task_id, None)?);
    Ok(Some(task))
}

/// Filtered, paginated task listing, newest first.
pub fn list_tasks(conn: &Connection, filter: &TaskFilter) -> Result<Vec<Task>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(agent_id) = &filter.agent_id {
        clauses.push("agent_id = ?");
        values.push(Value::Text(agent_id.clone()));
    }
    if let Some(status) = filter.status {
        clauses.push("status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    values.push(Value::Integer(filter.limit.map_or(-1, |l| l as i64)));
    values.push(Value::Integer(filter.offset.unwrap_or(0) as i64));

    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks {where_clause} \
         ORDER BY created_at DESC, task_id DESC LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let tasks = stmt
        .query_map(params_from_iter(values), row_to_task)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tasks)
}

/// Apply a partial update and bump `updated_at`. Returns `None` if the task does not exist.
pub fn update_task(conn: &Connection, task_id: &str, patch: &TaskPatch) -> Result<Option<Task>> {
    let mut sets: Vec<&str> = vec!["updated_at = ?"];
    let mut values: Vec<Value> = vec![Value::Text(chrono::Utc::now().to_rfc3339())];

    if let Some(agent_id) = &patch.agent_id {
        sets.push("agent_id = ?");
        values.push(Value::Text(agent_id.clone()));
    }
    if let Some(title) = &patch.title {
        sets.push("title = ?");
        values.push(Value::Text(title.clone()));
    }
    if let Some(description) = &patch.description {
        sets.push("description = ?");
        values.push(match description {
            Some(d) => Value::Text(d.clone()),
            None => Value::Null,
        });
    }
    if let Some(status) = patch.status {
        sets.push("status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }

    values.push(Value::Text(task_id.to_string()));
    let updated = conn.execute(
        &format!("UPDATE tasks SET {} WHERE task_id = ?", sets.join(", ")),
        params_from_iter(values),
    )?;

    if updated == 0 {
        tracing::warn!(task_id = %task_id, "task not found for update");
        return Ok(None);
    }

    tracing::info!(task_id = %task_id, "task updated");
    find_task(conn, task_id, None)
}

pub fn update_task_status(
    conn: &Connection,
    task_id: &str,
    status: WorkStatus,
) -> Result<Option<Task>> {
    update_task(
        conn,
        task_id,
        &TaskPatch {
            status: Some(status),
            ..Default::default()
        },
    )
}

/// Delete a task and its notes. Returns `false` if the task did not exist.
pub fn delete_task(conn: &mut Connection, task_id: &str) -> Result<bool> {
    let tx = conn.transaction()?;
    let deleted = tx.execute("DELETE FROM tasks WHERE task_id = ?1", params![task_id])?;
    if deleted == 0 {
        tracing::warn!(task_id = %task_id, "task not found for deletion");
        return Ok(false);
    }
    let notes = tx.execute("DELETE FROM notes WHERE task_id = ?1", params![task_id])?;
    tx.commit()?;

    tracing::info!(task_id = %task_id, notes_deleted = notes, "task deleted");
    Ok(true)
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    let status: String = row.get(4)?;
    let status = status
        .parse::<WorkStatus>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, e.into()))?;

    Ok(Task {
        task_id: row.get(0)?,
        agent_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        status,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        notes: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_task(agent: &str, title: &str) -> NewTask {
        NewTask {
            agent_id: agent.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn create_defaults_to_pending() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let task = create_task(&mut conn, &new_task("agent-1", "Index repo")).unwrap();
        assert_eq!(task.status, WorkStatus::Pending);
        assert_eq!(task.created_at, task.updated_at);
        assert_eq!(ids::parse_id(&task.task_id).unwrap().kind, IdKind::Task);
    }

    #[test]
    fn find_respects_agent_filter() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let task = create_task(&mut conn, &new_task("agent-1", "Mine")).unwrap();

        assert!(find_task(&conn, &task.task_id, Some("agent-1")).unwrap().is_some());
        assert!(find_task(&conn, &task.task_id, Some("agent-2")).unwrap().is_none());
        assert!(find_task(&conn, &task.task_id, None).unwrap().is_some());
    }

    #[test]
    fn duplicate_explicit_id_is_rejected() {
        let mut conn = crate::db::open_memory_database().unwrap();
        let mut input = new_task("agent-1", "First");
        input.task_id = Some("session_20251005_001".into());
        create_task(&mut conn, &input).unwrap();

        let err = create_task(&mut conn, &input).unwrap_err();
        assert!(err.to_string().contains("failed to insert task session_20251005_001"));
    }

    #[test]
    fn update_missing_task_returns_none() {
        let conn = crate::db::open_memory_database().unwrap();
        let result = update_task_status(&conn, "session_20251005_404", WorkStatus::Blocked).unwrap();
        assert!(result.is_none());
    }
}
