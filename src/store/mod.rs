//! Note and task storage: identifier allocation, record types, and the
//! SQLite-backed repositories behind the MCP tools.

pub mod ids;
pub mod notes;
pub mod tasks;
pub mod types;
