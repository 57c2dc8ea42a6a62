//! Identifier format `<prefix>_<YYYYMMDD>_<NNN>`.
//!
//! Prefixes: `note` for notes, `session` for tasks, `subtask` for subtasks.
//! New ids take the next free sequence number for the prefix and UTC date, read
//! from the table that owns them; callers allocate inside the inserting
//! transaction so two writers cannot take the same number.

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::{params, Connection};
use std::sync::LazyLock;
use thiserror::Error;

static ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(note|session|subtask)_(\d{8})_(\d{3})$").expect("id pattern is valid")
});

/// Highest sequence number that fits the three-digit suffix.
pub const MAX_SEQUENCE: u32 = 999;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("malformed {kind} id: {value} (expected {kind}_YYYYMMDD_NNN)")]
    Malformed { kind: &'static str, value: String },
    #[error("no {kind} ids left for {date}: sequence exhausted at 999")]
    SequenceExhausted { kind: &'static str, date: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Note,
    Task,
    Subtask,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Task => "session",
            Self::Subtask => "subtask",
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "note" => Some(Self::Note),
            "session" => Some(Self::Task),
            "subtask" => Some(Self::Subtask),
            _ => None,
        }
    }

    /// Table and column holding ids of this kind.
    fn owner(&self) -> (&'static str, &'static str) {
        match self {
            Self::Note => ("notes", "note_id"),
            Self::Task => ("tasks", "task_id"),
            Self::Subtask => ("notes", "subtask_id"),
        }
    }
}

/// The parts of a well-formed id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedId {
    pub kind: IdKind,
    pub date: NaiveDate,
    pub sequence: u32,
}

pub fn format_id(kind: IdKind, date: NaiveDate, sequence: u32) -> String {
    format!("{}_{}_{:03}", kind.prefix(), date.format("%Y%m%d"), sequence)
}

/// Parse any id; `None` if it does not match the format or names an impossible date.
pub fn parse_id(value: &str) -> Option<ParsedId> {
    let caps = ID_PATTERN.captures(value)?;
    let kind = IdKind::from_prefix(&caps[1])?;
    let date = NaiveDate::parse_from_str(&caps[2], "%Y%m%d").ok()?;
    let sequence = caps[3].parse().ok()?;
    Some(ParsedId {
        kind,
        date,
        sequence,
    })
}

/// Check that `value` is a well-formed id of the given kind.
pub fn validate_id(kind: IdKind, value: &str) -> Result<(), IdError> {
    match parse_id(value) {
        Some(parsed) if parsed.kind == kind => Ok(()),
        _ => Err(IdError::Malformed {
            kind: kind.prefix(),
            value: value.to_string(),
        }),
    }
}

/// Allocate the next id of `kind` for `date`.
pub fn next_id(conn: &Connection, kind: IdKind, date: NaiveDate) -> anyhow::Result<String> {
    let (table, column) = kind.owner();
    let prefix = format!("{}_{}_", kind.prefix(), date.format("%Y%m%d"));

    let max: Option<i64> = conn.query_row(
        &format!(
            "SELECT MAX(CAST(substr({column}, -3) AS INTEGER)) FROM {table} \
             WHERE substr({column}, 1, ?2) = ?1"
        ),
        params![prefix, prefix.len() as i64],
        |row| row.get(0),
    )?;

    let next = max.unwrap_or(0) as u32 + 1;
    if next > MAX_SEQUENCE {
        return Err(IdError::SequenceExhausted {
            kind: kind.prefix(),
            date: date.format("%Y%m%d").to_string(),
        }
        .into());
    }
    Ok(format_id(kind, date, next))
}

/// Today's UTC date, the date component of newly allocated ids.
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
