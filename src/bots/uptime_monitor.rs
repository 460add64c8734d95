use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use tracing::{debug, info, warn};

use super::{BotContext, BotHandler};
use crate::action::{OutboundAction, SendText};
use crate::error::DispatchResult;
use crate::storage::monitor::MonitorStore;
use crate::update::UpdateVariant;

pub const ALERT_DOWN: i64 = 1;
pub const ALERT_UP: i64 = 2;

/// Alert parameters sent by the uptime monitor as a query string
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorAlert {
    pub monitor_id: String,
    pub monitor_url: String,
    pub friendly_name: String,
    pub alert_type: i64,
    pub alert_type_name: String,
    pub details: String,
    pub duration_secs: Option<u64>,
    pub timestamp: Option<i64>,
}

impl MonitorAlert {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let get = |key: &str| params.get(key).map(|v| v.trim().to_string()).unwrap_or_default();
        Self {
            monitor_id: get("monitorID"),
            monitor_url: get("monitorURL"),
            friendly_name: get("monitorFriendlyName"),
            alert_type: get("alertType").parse().unwrap_or_default(),
            alert_type_name: get("alertTypeFriendlyName"),
            details: get("alertDetails"),
            duration_secs: get("alertDuration").parse().ok(),
            timestamp: get("alertDateTime").parse().ok(),
        }
    }

    fn display_name(&self) -> &str {
        if self.friendly_name.is_empty() {
            &self.monitor_url
        } else {
            &self.friendly_name
        }
    }

    pub fn message_text(&self) -> String {
        let mut text = match self.alert_type {
            ALERT_DOWN => format!(
                "Monitor \"{}\" ({}) is DOWN.\nReason: {}",
                self.display_name(),
                self.monitor_url,
                self.details
            ),
            ALERT_UP => {
                let mut up = format!(
                    "Monitor \"{}\" ({}) is back UP",
                    self.display_name(),
                    self.monitor_url
                );
                if let Some(secs) = self.duration_secs {
                    up.push_str(&format!(" after {}", format_duration(secs)));
                }
                up.push('.');
                up
            }
            _ => format!(
                "Monitor \"{}\" ({}): {} {}",
                self.display_name(),
                self.monitor_url,
                self.alert_type_name,
                self.details
            )
            .trim_end()
            .to_string(),
        };

        if let Some(at) = self.timestamp.and_then(|ts| DateTime::from_timestamp(ts, 0)) {
            text.push_str(&format!("\nAt: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
        }

        text
    }
}

fn format_duration(secs: u64) -> String {
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    match (hours, minutes) {
        (0, 0) => format!("{}s", seconds),
        (0, _) => format!("{}m {}s", minutes, seconds),
        _ => format!("{}h {}m {}s", hours, minutes, seconds),
    }
}

/// Pending acknowledgement of a recorded alert
pub struct EventHandle {
    store: MonitorStore,
    correlation_id: String,
    event_id: String,
}

impl EventHandle {
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub async fn set_event_notified(&self, message_id: i32) -> Result<()> {
        debug!(
            "Marking event {} of {} as notified by message {}",
            self.event_id, self.correlation_id, message_id
        );
        self.store.set_event_notified(&self.event_id, message_id).await
    }
}

pub struct MonitorOutcome {
    pub action: OutboundAction,
    pub event: Option<EventHandle>,
}

/// Relays uptime monitor alerts to subscribed chats and hands out the
/// notification URL on `/start`.
pub struct UptimeMonitorBot {
    store: MonitorStore,
    public_url: String,
    bot_name: String,
}

impl UptimeMonitorBot {
    pub fn new(store: MonitorStore, public_url: &str, bot_name: &str) -> Self {
        Self {
            store,
            public_url: public_url.trim_end_matches('/').to_string(),
            bot_name: bot_name.to_string(),
        }
    }

    pub fn notify_url(&self, subscription_id: &str) -> String {
        format!("{}/{}/{}", self.public_url, self.bot_name, subscription_id)
    }

    /// Turn a monitor callback into a message for the subscribed chat.
    pub async fn handle_notification(
        &self,
        alert: &MonitorAlert,
        correlation_id: &str,
    ) -> DispatchResult<MonitorOutcome> {
        let Some(subscription) = self.store.find_subscription(correlation_id).await? else {
            warn!("No subscription found for correlation id {}", correlation_id);
            return Ok(MonitorOutcome {
                action: OutboundAction::None,
                event: None,
            });
        };

        info!(
            "Alert type {} for monitor {} ({}) to chat {}",
            alert.alert_type, alert.monitor_id, alert.monitor_url, subscription.chat_id
        );

        // Quote the announcement of the outage when the monitor comes back up
        let reply_to = if alert.alert_type == ALERT_UP {
            self.store
                .last_notified_message(&subscription.id, &alert.monitor_id, ALERT_DOWN)
                .await?
        } else {
            None
        };

        let event_id = self
            .store
            .record_event(&subscription.id, &alert.monitor_id, alert.alert_type, &alert.details)
            .await?;

        Ok(MonitorOutcome {
            action: OutboundAction::SendText(
                SendText::new(subscription.chat_id, alert.message_text()).reply_to(reply_to),
            ),
            event: Some(EventHandle {
                store: self.store.clone(),
                correlation_id: subscription.id,
                event_id,
            }),
        })
    }

    async fn handle_command(&self, text: &str, chat_id: i64) -> DispatchResult<OutboundAction> {
        let command = text
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("");

        match command {
            "/start" | "/get_notify_url" => {
                let subscription = self.store.get_or_create_subscription(chat_id).await?;
                Ok(OutboundAction::send_text(
                    chat_id,
                    format!(
                        "Add this URL as a webhook alert contact in your uptime monitor:\n{}\n\n\
                         Alerts for your monitors will be posted in this chat.",
                        self.notify_url(&subscription.id)
                    ),
                ))
            }
            "/help" => Ok(OutboundAction::send_text(
                chat_id,
                "Commands:\n\
                 /start - Get the webhook URL for your uptime monitor\n\
                 /get_notify_url - Show the webhook URL again\n\
                 /help - Show this message",
            )),
            _ => Ok(OutboundAction::None),
        }
    }
}

#[async_trait]
impl BotHandler for UptimeMonitorBot {
    async fn create_answer(
        &self,
        variant: UpdateVariant<'_>,
        _ctx: &BotContext<'_>,
    ) -> DispatchResult<OutboundAction> {
        match variant {
            UpdateVariant::Message { message, chat_id } => match message.text.as_deref() {
                Some(text) if text.starts_with('/') => self.handle_command(text, chat_id).await,
                _ => Ok(OutboundAction::None),
            },
            other => {
                debug!("Ignoring {} update", other.kind());
                Ok(OutboundAction::None)
            }
        }
    }
}
