//! TripLoom storage crate - persistence for AI conversations and context.
//!
//! Exposes the [`AiRepository`] trait consumed by the chat pipeline, with an
//! in-process implementation guarded by a reader/writer lock and a WAL-mode
//! SQLite implementation with migrations.

pub mod db;
pub mod memory;
pub mod migrations;
pub mod repository;
pub mod sqlite;
pub mod types;

pub use db::Database;
pub use memory::{InMemoryRepository, MAX_RECORDED_ROWS};
pub use repository::{AiRepository, MAX_CONVERSATIONS};
pub use sqlite::SqliteRepository;
pub use types::{
    AuditLogEntry, ContextSnapshot, Conversation, StoredMessage, ToolSnapshot, Trip,
};
