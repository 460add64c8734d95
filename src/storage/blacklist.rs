use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Chats that must never again receive a message from a given bot.
///
/// `bot_id` is the numeric prefix of the bot token, which Telegram uses as
/// the bot's user id.
#[derive(Clone)]
pub struct BlacklistStore {
    conn: Arc<Mutex<Connection>>,
}

impl BlacklistStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub async fn contains(&self, bot_id: &str, chat_id: i64) -> Result<bool> {
        let conn = self.conn.lock().await;
        let found: bool = conn
            .query_row(
                "SELECT count(*) > 0 FROM blacklisted_chats WHERE bot_id = ?1 AND chat_id = ?2",
                rusqlite::params![bot_id, chat_id],
                |row| row.get(0),
            )
            .context("Failed to query blacklist")?;
        Ok(found)
    }

    pub async fn add(&self, bot_id: &str, chat_id: i64, reason: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO blacklisted_chats (bot_id, chat_id, reason) VALUES (?1, ?2, ?3)
             ON CONFLICT(bot_id, chat_id) DO UPDATE SET reason = excluded.reason",
            rusqlite::params![bot_id, chat_id, reason],
        )
        .context("Failed to blacklist chat")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[tokio::test]
    async fn test_add_and_contains() {
        let db = Database::open_in_memory().unwrap();
        let store = BlacklistStore::new(db.connection());

        assert!(!store.contains("111", -100).await.unwrap());
        store.add("111", -100, "blocked by user").await.unwrap();
        assert!(store.contains("111", -100).await.unwrap());
        assert!(!store.contains("111", 200).await.unwrap());
    }

    #[tokio::test]
    async fn test_entries_are_scoped_to_one_bot() {
        let db = Database::open_in_memory().unwrap();
        let store = BlacklistStore::new(db.connection());

        store.add("111", 42, "bot was blocked by the user").await.unwrap();
        assert!(store.contains("111", 42).await.unwrap());
        assert!(!store.contains("222", 42).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_twice_keeps_one_row() {
        let db = Database::open_in_memory().unwrap();
        let store = BlacklistStore::new(db.connection());

        store.add("111", 5, "first").await.unwrap();
        store.add("111", 5, "second").await.unwrap();

        let conn = db.connection();
        let conn = conn.lock().await;
        let (count, reason): (i64, String) = conn
            .query_row(
                "SELECT count(*), max(reason) FROM blacklisted_chats WHERE chat_id = 5",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(reason, "second");
    }
}
