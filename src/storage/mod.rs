pub mod blacklist;
pub mod monitor;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Shared SQLite handle for the blacklist and monitor tables
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // journal_mode PRAGMA always returns the resulting mode, so use query_row
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        // Migrate before wrapping in the async Mutex
        Self::run_migrations(&conn)?;

        info!("Database initialized at: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            -- A user blocks one bot, not all of them: keyed per bot
            CREATE TABLE IF NOT EXISTS blacklisted_chats (
                bot_id TEXT NOT NULL,
                chat_id INTEGER NOT NULL,
                reason TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                PRIMARY KEY (bot_id, chat_id)
            );

            -- One subscription per chat; id is the correlation id in the monitor URL
            CREATE TABLE IF NOT EXISTS monitor_subscriptions (
                id TEXT PRIMARY KEY,
                chat_id INTEGER NOT NULL UNIQUE,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS monitor_events (
                id TEXT PRIMARY KEY,
                subscription_id TEXT NOT NULL,
                monitor_id TEXT NOT NULL,
                alert_type INTEGER NOT NULL,
                details TEXT,
                notified_message_id INTEGER,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (subscription_id) REFERENCES monitor_subscriptions(id)
            );

            CREATE INDEX IF NOT EXISTS idx_monitor_events_lookup
                ON monitor_events(subscription_id, monitor_id, alert_type);
            ",
        )
        .context("Failed to run database migrations")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_migrations_create_tables() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.connection();
        let conn = conn.lock().await;
        let count: i64 = conn
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table'
                 AND name IN ('blacklisted_chats', 'monitor_subscriptions', 'monitor_events')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }

    #[test]
    fn test_open_on_disk_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bots.db");
        Database::open(&path).unwrap();
        Database::open(&path).unwrap();
        assert!(path.exists());
    }
}
