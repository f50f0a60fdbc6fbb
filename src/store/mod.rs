mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use sqlite::SqliteCommandStore;

/// A learned command as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: String,
    pub tool_name: String,
    pub command_text: String,
    pub explanation: String,
}

/// A command that has not been stored yet. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCommand {
    pub tool_name: String,
    pub command_text: String,
    pub explanation: String,
}

impl NewCommand {
    pub fn new(
        tool_name: impl Into<String>,
        command_text: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        NewCommand {
            tool_name: tool_name.into(),
            command_text: command_text.into(),
            explanation: explanation.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database connection lock poisoned")]
    Poisoned,

    #[error("database task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[async_trait]
pub trait CommandStore: Send + Sync {
    async fn save(&self, command: NewCommand) -> Result<Command, StoreError>;

    /// All commands for `tool_name` (exact match), in insertion order.
    async fn find_by_tool(&self, tool_name: &str) -> Result<Vec<Command>, StoreError>;

    /// Commands for `tool_name` whose text contains `text`, ignoring case.
    async fn search_by_tool_and_text(
        &self,
        tool_name: &str,
        text: &str,
    ) -> Result<Vec<Command>, StoreError>;

    async fn count_by_tool(&self, tool_name: &str) -> Result<u64, StoreError>;
}
