pub mod unreal4u;
pub mod uptime_monitor;

use async_trait::async_trait;

use crate::action::OutboundAction;
use crate::error::DispatchResult;
use crate::platform::Transport;
use crate::registry::BotIdentity;
use crate::update::UpdateVariant;

/// Everything a handler may reach while answering one update
pub struct BotContext<'a> {
    pub identity: &'a BotIdentity,
    pub transport: &'a dyn Transport,
}

/// One handler set: maps each update variant to an outbound action.
#[async_trait]
pub trait BotHandler: Send + Sync {
    async fn create_answer(
        &self,
        variant: UpdateVariant<'_>,
        ctx: &BotContext<'_>,
    ) -> DispatchResult<OutboundAction>;
}
