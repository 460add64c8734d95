use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// A chat that receives uptime monitor alerts through its correlation id.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub id: String,
    pub chat_id: i64,
}

#[derive(Clone)]
pub struct MonitorStore {
    conn: Arc<Mutex<Connection>>,
}

impl MonitorStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    pub async fn find_subscription(&self, id: &str) -> Result<Option<Subscription>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT id, chat_id FROM monitor_subscriptions WHERE id = ?1",
            rusqlite::params![id],
            |row| {
                Ok(Subscription {
                    id: row.get(0)?,
                    chat_id: row.get(1)?,
                })
            },
        )
        .optional()
        .context("Failed to query monitor subscription")
    }

    /// Return the chat's subscription, creating one on first use.
    pub async fn get_or_create_subscription(&self, chat_id: i64) -> Result<Subscription> {
        let conn = self.conn.lock().await;

        let existing: Option<String> = conn
            .query_row(
                "SELECT id FROM monitor_subscriptions WHERE chat_id = ?1",
                rusqlite::params![chat_id],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up subscription by chat")?;

        if let Some(id) = existing {
            return Ok(Subscription { id, chat_id });
        }

        let id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO monitor_subscriptions (id, chat_id) VALUES (?1, ?2)",
            rusqlite::params![&id, chat_id],
        )
        .context("Failed to create monitor subscription")?;

        Ok(Subscription { id, chat_id })
    }

    /// Store an incoming alert and return its event id.
    pub async fn record_event(
        &self,
        subscription_id: &str,
        monitor_id: &str,
        alert_type: i64,
        details: &str,
    ) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO monitor_events (id, subscription_id, monitor_id, alert_type, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![&id, subscription_id, monitor_id, alert_type, details],
        )
        .context("Failed to record monitor event")?;
        Ok(id)
    }

    pub async fn set_event_notified(&self, event_id: &str, message_id: i32) -> Result<()> {
        let conn = self.conn.lock().await;
        let updated = conn
            .execute(
                "UPDATE monitor_events SET notified_message_id = ?1 WHERE id = ?2",
                rusqlite::params![message_id, event_id],
            )
            .context("Failed to mark monitor event as notified")?;
        if updated == 0 {
            anyhow::bail!("Monitor event not found: {}", event_id);
        }
        Ok(())
    }

    /// Message id of the latest notified alert of `alert_type` for a monitor.
    pub async fn last_notified_message(
        &self,
        subscription_id: &str,
        monitor_id: &str,
        alert_type: i64,
    ) -> Result<Option<i32>> {
        let conn = self.conn.lock().await;
        conn.query_row(
            "SELECT notified_message_id FROM monitor_events
             WHERE subscription_id = ?1 AND monitor_id = ?2 AND alert_type = ?3
               AND notified_message_id IS NOT NULL
             ORDER BY created_at DESC, rowid DESC LIMIT 1",
            rusqlite::params![subscription_id, monitor_id, alert_type],
            |row| row.get(0),
        )
        .optional()
        .context("Failed to query last notified alert")
    }
}
