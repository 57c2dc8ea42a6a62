//! Note repository over the `notes` table.
//!
//! Lookups that miss return `Ok(None)` / `Ok(false)`; errors are reserved for
//! malformed input and database failures.

use anyhow::{Context, Result};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::ids::{self, IdKind};
use super::types::{NewNote, Note, NoteFilter, NotePatch, WorkStatus};

const NOTE_COLUMNS: &str = "note_id, agent_id, task_id, timestamp, task_title, subtask_id, \
     subtask_title, content, subtask_status, public_state, metadata";

/// Insert a note, allocating `note_id` (and `subtask_id` when only a subtask
/// title is given) in the same transaction.
pub fn create_note(conn: &mut Connection, new: &NewNote) -> Result<Note> {
    ids::validate_id(IdKind::Task, &new.task_id)?;
    if let Some(id) = &new.note_id {
        ids::validate_id(IdKind::Note, id)?;
    }
    if let Some(id) = &new.subtask_id {
        ids::validate_id(IdKind::Subtask, id)?;
    }

    let tx = conn.transaction()?;
    let today = ids::today();

    let note_id = match &new.note_id {
        Some(id) => id.clone(),
        None => ids::next_id(&tx, IdKind::Note, today)?,
    };
    let subtask_id = match (&new.subtask_id, &new.subtask_title) {
        (Some(id), _) => Some(id.clone()),
        (None, Some(_)) => Some(ids::next_id(&tx, IdKind::Subtask, today)?),
        (None, None) => None,
    };
    let timestamp = chrono::Utc::now().to_rfc3339();
    let metadata_json = new.metadata.as_ref().map(serde_json::to_string).transpose()?;

    tx.execute(
        "INSERT INTO notes (note_id, agent_id, task_id, timestamp, task_title, subtask_id, \
         subtask_title, content, subtask_status, public_state, metadata) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            note_id,
            new.agent_id,
            new.task_id,
            timestamp,
            new.task_title,
            subtask_id,
            new.subtask_title,
            new.content,
            new.subtask_status.as_str(),
            new.public_state,
            metadata_json,
        ],
    )
    .with_context(|| format!("failed to insert note {note_id}"))?;
    tx.commit()?;

    tracing::info!(note_id = %note_id, task_id = %new.task_id, "note created");

    Ok(Note {
        note_id,
        agent_id: new.agent_id.clone(),
        task_id: new.task_id.clone(),
        timestamp,
        task_title: new.task_title.clone(),
        subtask_id,
        subtask_title: new.subtask_title.clone(),
        content: new.content.clone(),
        subtask_status: new.subtask_status,
        public_state: new.public_state,
        metadata: new.metadata.clone(),
    })
}

pub fn find_note(conn: &Connection, note_id: &str) -> Result<Option<Note>> {
    let note = conn
        .query_row(
            &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE note_id = ?1"),
            params![note_id],
            row_to_note,
        )
        .optional()?;
    Ok(note)
}

/// All notes of a task, newest first, optionally restricted to one agent.
pub fn find_notes_by_task(
    conn: &Connection,
    task_id: &str,
    agent_id: Option<&str>,
) -> Result<Vec<Note>> {
    search_notes(
        conn,
        &NoteFilter {
            task_id: Some(task_id.to_string()),
            agent_id: agent_id.map(str::to_string),
            ..Default::default()
        },
    )
}

/// Filtered, paginated note search, newest first.
pub fn search_notes(conn: &Connection, filter: &NoteFilter) -> Result<Vec<Note>> {
    let mut clauses: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(task_id) = &filter.task_id {
        clauses.push("task_id = ?");
        values.push(Value::Text(task_id.clone()));
    }
    if let Some(subtask_id) = &filter.subtask_id {
        clauses.push("subtask_id = ?");
        values.push(Value::Text(subtask_id.clone()));
    }
    if let Some(agent_id) = &filter.agent_id {
        clauses.push("agent_id = ?");
        values.push(Value::Text(agent_id.clone()));
    }
    if let Some(query) = filter.query.as_deref().filter(|q| !q.is_empty()) {
        clauses.push("casefold(content) LIKE casefold(?) ESCAPE '\\'");
        values.push(Value::Text(format!("%{}%", escape_like(query))));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    // SQLite treats a negative LIMIT as "no limit".
    values.push(Value::Integer(filter.limit.map_or(-1, |l| l as i64)));
    values.push(Value::Integer(filter.offset.unwrap_or(0) as i64));

    let sql = format!(
        "SELECT {NOTE_COLUMNS} FROM notes {where_clause} \
         ORDER BY timestamp DESC, note_id DESC LIMIT ? OFFSET ?"
    );
    let mut stmt = conn.prepare(&sql)?;
    let notes = stmt
        .query_map(params_from_iter(values), row_to_note)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(notes)
}

pub fn update_note_status(
    conn: &Connection,
    note_id: &str,
    status: WorkStatus,
) -> Result<Option<Note>> {
    update_note(
        conn,
        note_id,
        &NotePatch {
            subtask_status: Some(status),
            ..Default::default()
        },
    )
}

/// Apply a partial update. Returns the updated note, or `None` if it does not exist.
pub fn update_note(conn: &Connection, note_id: &str, patch: &NotePatch) -> Result<Option<Note>> {
    let mut sets: Vec<&str> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(agent_id) = &patch.agent_id {
        sets.push("agent_id = ?");
        values.push(Value::Text(agent_id.clone()));
    }
    if let Some(task_id) = &patch.task_id {
        ids::validate_id(IdKind::Task, task_id)?;
        sets.push("task_id = ?");
        values.push(Value::Text(task_id.clone()));
    }
    if let Some(task_title) = &patch.task_title {
        sets.push("task_title = ?");
        values.push(Value::Text(task_title.clone()));
    }
    if let Some(subtask_id) = &patch.subtask_id {
        if let Some(id) = subtask_id {
            ids::validate_id(IdKind::Subtask, id)?;
        }
        sets.push("subtask_id = ?");
        values.push(optional_text(subtask_id));
    }
    if let Some(subtask_title) = &patch.subtask_title {
        sets.push("subtask_title = ?");
        values.push(optional_text(subtask_title));
    }
    if let Some(content) = &patch.content {
        sets.push("content = ?");
        values.push(Value::Text(content.clone()));
    }
    if let Some(status) = patch.subtask_status {
        sets.push("subtask_status = ?");
        values.push(Value::Text(status.as_str().to_string()));
    }
    if let Some(public_state) = patch.public_state {
        sets.push("public_state = ?");
        values.push(Value::Integer(public_state as i64));
    }

    if sets.is_empty() {
        return find_note(conn, note_id);
    }

    values.push(Value::Text(note_id.to_string()));
    let updated = conn.execute(
        &format!("UPDATE notes SET {} WHERE note_id = ?", sets.join(", ")),
        params_from_iter(values),
    )?;

    if updated == 0 {
        tracing::warn!(note_id = %note_id, "note not found for update");
        return Ok(None);
    }

    tracing::info!(note_id = %note_id, fields = sets.len(), "note updated");
    find_note(conn, note_id)
}

/// Delete a note. Returns `false` if it did not exist.
pub fn delete_note(conn: &Connection, note_id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM notes WHERE note_id = ?1", params![note_id])?;
    if deleted == 0 {
        tracing::warn!(note_id = %note_id, "note not found for deletion");
        return Ok(false);
    }
    tracing::info!(note_id = %note_id, "note deleted");
    Ok(true)
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::Text(s.clone()),
        None => Value::Null,
    }
}

/// Escape `%`, `_`, and the escape character itself for a `LIKE ... ESCAPE '\'` pattern.
pub(crate) fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn row_to_note(row: &Row<'_>) -> rusqlite::Result<Note> {
    let status: String = row.get(8)?;
    let subtask_status = status.parse::<WorkStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, Type::Text, e.into())
    })?;
    let metadata = row
        .get::<_, Option<String>>(10)?
        .map(|m| serde_json::from_str(&m))
        .transpose()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e)))?;

    Ok(Note {
        note_id: row.get(0)?,
        agent_id: row.get(1)?,
        task_id: row.get(2)?,
        timestamp: row.get(3)?,
        task_title: row.get(4)?,
        subtask_id: row.get(5)?,
        subtask_title: row.get(6)?,
        content: row.get(7)?,
        subtask_status,
        public_state: row.get(9)?,
        metadata,
    })
}
