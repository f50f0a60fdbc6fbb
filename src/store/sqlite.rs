use super::{Command, CommandStore, NewCommand, StoreError};
use async_trait::async_trait;
use log::debug;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS commands (
        seq          INTEGER PRIMARY KEY AUTOINCREMENT,
        id           TEXT NOT NULL UNIQUE,
        tool_name    TEXT NOT NULL,
        command_text TEXT NOT NULL,
        explanation  TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_commands_tool_name ON commands(tool_name);
";

/// Command store backed by a single SQLite connection.
#[derive(Clone)]
pub struct SqliteCommandStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteCommandStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_| Ok(()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteCommandStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&guard).map_err(StoreError::from)
        })
        .await?
    }
}

fn command_from_row(row: &Row<'_>) -> rusqlite::Result<Command> {
    Ok(Command {
        id: row.get(0)?,
        tool_name: row.get(1)?,
        command_text: row.get(2)?,
        explanation: row.get(3)?,
    })
}

fn select_by_tool(conn: &Connection, tool_name: &str) -> rusqlite::Result<Vec<Command>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, tool_name, command_text, explanation
         FROM commands WHERE tool_name = ?1 ORDER BY seq",
    )?;
    let commands = stmt
        .query_map(params![tool_name], command_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(commands)
}

#[async_trait]
impl CommandStore for SqliteCommandStore {
    async fn save(&self, command: NewCommand) -> Result<Command, StoreError> {
        let stored = Command {
            id: Uuid::new_v4().to_string(),
            tool_name: command.tool_name,
            command_text: command.command_text,
            explanation: command.explanation,
        };
        debug!("Saving {} command {}", stored.tool_name, stored.id);

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO commands (id, tool_name, command_text, explanation)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    stored.id,
                    stored.tool_name,
                    stored.command_text,
                    stored.explanation
                ],
            )?;
            Ok(stored)
        })
        .await
    }

    async fn find_by_tool(&self, tool_name: &str) -> Result<Vec<Command>, StoreError> {
        let tool_name = tool_name.to_string();
        self.with_conn(move |conn| select_by_tool(conn, &tool_name))
            .await
    }

    async fn search_by_tool_and_text(
        &self,
        tool_name: &str,
        text: &str,
    ) -> Result<Vec<Command>, StoreError> {
        // SQLite's LIKE and lower() only fold ASCII, so the match is done here.
        let needle = text.to_lowercase();
        let commands = self.find_by_tool(tool_name).await?;
        Ok(commands
            .into_iter()
            .filter(|c| c.command_text.to_lowercase().contains(&needle))
            .collect())
    }

    async fn count_by_tool(&self, tool_name: &str) -> Result<u64, StoreError> {
        let tool_name = tool_name.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM commands WHERE tool_name = ?1",
                params![tool_name],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|count| count as u64)
    }
}
