//! Structured notes, tasks, and pre-compaction retention for AI agents via MCP.
//!
//! SRP is an [MCP](https://modelcontextprotocol.io/) server that lets agents record their
//! progress as tasks and notes, recover it later, and decide which items survive when the
//! host is about to compact the agent's context window.
//!
//! # Architecture
//!
//! - **Storage**: SQLite (WAL mode) holding `tasks` and `notes`, with forward-only migrations
//! - **Identifiers**: `<prefix>_<YYYYMMDD>_<NNN>`, allocated per prefix and day
//! - **Compaction**: a pure evaluator that partitions items into preserved and removed
//!   according to a pluggable retention policy
//! - **Transport**: MCP over stdio (primary) or Streamable HTTP, plus a `pre-compact` hook
//!   that runs one evaluation over stdin/stdout
//!
//! # Modules
//!
//! - [`compaction`]: retention policies and the pre-compaction evaluator
//! - [`config`]: configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, and migrations
//! - [`hook`]: the stdin/stdout `pre-compact` entry point
//! - [`server`]: stdio and streamable-HTTP transports
//! - [`store`]: identifier allocation and the note and task repositories
//! - [`tools`]: the MCP tool handler and its parameter types

pub mod compaction;
pub mod config;
pub mod db;
pub mod hook;
pub mod server;
pub mod store;
pub mod tools;
