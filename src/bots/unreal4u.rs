use async_trait::async_trait;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};

use super::{BotContext, BotHandler};
use crate::action::{AnswerInlineQuery, InlineResultArticle, OutboundAction};
use crate::error::{DispatchError, DispatchResult};
use crate::media::MediaArchive;
use crate::update::{CallbackQuery, InlineQuery, Message, UpdateVariant};

const DEFAULT_QUERY: &str = "What is lmgtfy?";
const STICKER_APOLOGY: &str = "There was a problem downloading your sticker, please retry later";

/// Sticker downloads, "let me google that for you" inline answers and
/// callback echoes.
pub struct Unreal4uBot {
    media: MediaArchive,
}

impl Unreal4uBot {
    pub fn new(media: MediaArchive) -> Self {
        Self { media }
    }

    async fn handle_message(
        &self,
        message: &Message,
        chat_id: i64,
        ctx: &BotContext<'_>,
    ) -> DispatchResult<OutboundAction> {
        let from = message.from.as_ref();
        info!(
            "Received message {}. Chat id: {}, user id: {}, user name: {}",
            message.message_id,
            chat_id,
            from.map(|u| u.id).unwrap_or_default(),
            from.and_then(|u| u.username.as_deref()).unwrap_or("")
        );

        match &message.sticker {
            Some(sticker) if !sticker.file_id.is_empty() => {
                self.download_sticker(&sticker.file_id, chat_id, ctx).await
            }
            _ => Ok(OutboundAction::None),
        }
    }

    async fn download_sticker(
        &self,
        file_id: &str,
        chat_id: i64,
        ctx: &BotContext<'_>,
    ) -> DispatchResult<OutboundAction> {
        debug!("Got a sticker request, downloading sticker {}", file_id);

        let stored = match ctx.transport.retrieve_file(file_id, &ctx.identity.token).await {
            Ok(file) => self.media.store(&file).await.map_err(DispatchError::from),
            Err(e) => Err(e),
        };

        let text = match stored {
            Ok(link) => format!("Download link for sticker: {}", link),
            Err(e @ DispatchError::Blacklisted { .. }) => return Err(e),
            Err(e) => {
                error!("Problem downloading sticker: {:#}", e);
                STICKER_APOLOGY.to_string()
            }
        };

        Ok(OutboundAction::send_text(chat_id, text))
    }
}

#[async_trait]
impl BotHandler for Unreal4uBot {
    async fn create_answer(
        &self,
        variant: UpdateVariant<'_>,
        ctx: &BotContext<'_>,
    ) -> DispatchResult<OutboundAction> {
        match variant {
            UpdateVariant::Message { message, chat_id } => {
                self.handle_message(message, chat_id, ctx).await
            }
            UpdateVariant::ChosenInlineResult(chosen) => {
                debug!("We have a chosen_inline_result back, result id: {}", chosen.result_id);
                Ok(OutboundAction::None)
            }
            UpdateVariant::InlineQuery(query) => Ok(inline_answer(query)),
            UpdateVariant::CallbackQuery(callback) => Ok(callback_reply(callback)),
            UpdateVariant::Unhandled => Ok(OutboundAction::None),
        }
    }
}

/// Stable article id for one result of one inline query
pub fn article_id(user_id: i64, inline_query_id: &str, result_index: u32) -> String {
    let key = json!({ "uid": user_id, "iqid": inline_query_id, "rid": result_index });
    hex::encode(Sha256::digest(key.to_string().as_bytes()))
}

fn search_article(id: String, base: &str, query: &str) -> InlineResultArticle {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let url = format!("{}{}", base, encoded);
    InlineResultArticle {
        id,
        title: url.clone(),
        message_text: url.clone(),
        url,
        hide_url: true,
        disable_link_preview: true,
    }
}

pub fn inline_answer(query: &InlineQuery) -> OutboundAction {
    info!(
        "Received inline query. User id {} (username: {}). Query: \"{}\", inline query id: {}",
        query.from.id,
        query.from.username.as_deref().unwrap_or(""),
        query.query,
        query.id
    );

    let text = if query.query.is_empty() {
        DEFAULT_QUERY
    } else {
        query.query.as_str()
    };

    let results = vec![
        search_article(
            article_id(query.from.id, &query.id, 1),
            "http://lmgtfy.com/?q=",
            text,
        ),
        search_article(
            article_id(query.from.id, &query.id, 2),
            "https://www.google.com/search?q=",
            text,
        ),
    ];

    OutboundAction::AnswerInlineQuery(AnswerInlineQuery {
        inline_query_id: query.id.clone(),
        results,
    })
}

pub fn callback_reply(callback: &CallbackQuery) -> OutboundAction {
    let Some(chat_id) = callback.message.as_ref().and_then(Message::chat_id) else {
        debug!("Callback query {} has no target chat", callback.id);
        return OutboundAction::None;
    };

    OutboundAction::send_text(
        chat_id,
        format!(
            "Data on the callback query: {}",
            callback.data.as_deref().unwrap_or("")
        ),
    )
}
