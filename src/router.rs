use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error, info, info_span, Instrument};

use crate::bots::unreal4u::Unreal4uBot;
use crate::bots::uptime_monitor::{MonitorAlert, UptimeMonitorBot};
use crate::bots::{BotContext, BotHandler};
use crate::config::BotKind;
use crate::error::{DispatchError, DispatchResult};
use crate::platform::Transport;
use crate::registry::{BotIdentity, BotRegistry};
use crate::update::{classify, InboundUpdate};

/// Terminal outcome of one request
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// 200 with an empty body
    Handled,
    /// 302 to the given location
    Redirect(String),
}

/// Entry point for every inbound request. Holds only read-only state.
pub struct RequestRouter {
    registry: BotRegistry,
    transport: Arc<dyn Transport>,
    unreal4u: Unreal4uBot,
    uptime_monitor: UptimeMonitorBot,
    monitor_bot_name: String,
    fallback_url: String,
}

impl RequestRouter {
    pub fn new(
        registry: BotRegistry,
        transport: Arc<dyn Transport>,
        unreal4u: Unreal4uBot,
        uptime_monitor: UptimeMonitorBot,
        monitor_bot_name: &str,
        fallback_url: &str,
    ) -> Self {
        Self {
            registry,
            transport,
            unreal4u,
            uptime_monitor,
            monitor_bot_name: monitor_bot_name.to_string(),
            fallback_url: fallback_url.to_string(),
        }
    }

    fn handler_for(&self, kind: BotKind) -> &dyn BotHandler {
        match kind {
            BotKind::Unreal4u => &self.unreal4u,
            BotKind::UptimeMonitor => &self.uptime_monitor,
        }
    }

    /// Route one request. `path` has no leading slash and no query string.
    pub async fn route(
        &self,
        path: &str,
        query: &HashMap<String, String>,
        body: &[u8],
    ) -> RouteOutcome {
        match self.registry.resolve(path) {
            Some(identity) => {
                info!(
                    "New request on bot {} ({} handlers)",
                    identity.name, identity.kind
                );
                let span = info_span!("bot", name = %identity.name);
                self.bot_request(identity, body).instrument(span).await
            }
            None => {
                info!("Received inbound url not coming from Telegram servers");
                self.monitor_notification(path, query).await
            }
        }
    }

    async fn bot_request(&self, identity: &BotIdentity, body: &[u8]) -> RouteOutcome {
        debug!("{} New request {}", "-".repeat(20), "-".repeat(20));

        match self.answer_update(identity, body).await {
            Ok(()) => {
                debug!("{} Finishing request {}", "-".repeat(20), "-".repeat(20));
            }
            Err(DispatchError::Blacklisted { chat_id }) => {
                info!("Blacklisted chatId found: {}", chat_id);
            }
            Err(DispatchError::Other(e)) => {
                error!("Captured exception: \"{:#}\" for bot {}", e, identity.name);
            }
        }

        RouteOutcome::Handled
    }

    async fn answer_update(&self, identity: &BotIdentity, body: &[u8]) -> DispatchResult<()> {
        let update: InboundUpdate =
            serde_json::from_slice(body).context("Failed to decode incoming update")?;
        debug!("Incoming update {:?}: {:?}", update.update_id, update);

        let variant = classify(&update);
        debug!("Update classified as {}", variant.kind());

        let ctx = BotContext {
            identity,
            transport: self.transport.as_ref(),
        };
        let action = self
            .handler_for(identity.kind)
            .create_answer(variant, &ctx)
            .await?;

        if action.is_none() {
            debug!("No response needed for this update");
        } else {
            debug!("Went through create_answer, sending response");
        }
        self.transport.deliver(&action, &identity.token).await?;
        Ok(())
    }

    async fn monitor_notification(
        &self,
        path: &str,
        query: &HashMap<String, String>,
    ) -> RouteOutcome {
        let mut segments = path.split('/');
        let bot = segments.next().unwrap_or("");
        let correlation_id = segments.next().unwrap_or("");

        if !bot.is_empty() {
            info!("Incoming request for bot {} with id {:?}", bot, correlation_id);
        }

        if bot.eq_ignore_ascii_case(&self.monitor_bot_name) && !correlation_id.is_empty() {
            let span = info_span!("bot", name = %self.monitor_bot_name);
            let result = self
                .relay_monitor_alert(correlation_id, query)
                .instrument(span)
                .await;

            match result {
                Ok(true) => return RouteOutcome::Handled,
                Ok(false) => {}
                Err(DispatchError::Blacklisted { chat_id }) => {
                    info!("Blacklisted chatId found: {}", chat_id);
                    return RouteOutcome::Handled;
                }
                Err(DispatchError::Other(e)) => {
                    error!("Failed to relay monitor notification: {:#}", e);
                }
            }
        }

        info!("Request not coming from monitor API or Telegram servers, redirecting");
        RouteOutcome::Redirect(self.fallback_url.clone())
    }

    /// Returns whether a message was delivered and its event acknowledged.
    async fn relay_monitor_alert(
        &self,
        correlation_id: &str,
        query: &HashMap<String, String>,
    ) -> DispatchResult<bool> {
        let identity = self
            .registry
            .find_by_name(&self.monitor_bot_name)
            .with_context(|| format!("No bot configured named {}", self.monitor_bot_name))?;

        let alert = MonitorAlert::from_params(query);
        let outcome = self
            .uptime_monitor
            .handle_notification(&alert, correlation_id)
            .await?;

        let sent = self.transport.deliver(&outcome.action, &identity.token).await?;

        match (sent, outcome.event) {
            (Some(message), Some(event)) => {
                info!(
                    "Alert for {} delivered as message {}",
                    event.correlation_id(),
                    message.message_id
                );
                event.set_event_notified(message.message_id).await?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
