use serde::Deserialize;

/// Inbound webhook payload. Telegram fills at most one of the optional
/// sections, but nothing on the wire enforces it, so [`classify`] applies a
/// fixed precedence.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InboundUpdate {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub chosen_inline_result: Option<ChosenInlineResult>,
    #[serde(default)]
    pub inline_query: Option<InlineQuery>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: i64,
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sticker: Option<Sticker>,
}

impl Message {
    /// Chat id, treating a missing or zero id as absent.
    pub fn chat_id(&self) -> Option<i64> {
        self.chat.as_ref().and_then(|c| c.id).filter(|id| *id != 0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sticker {
    pub file_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InlineQuery {
    pub id: String,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChosenInlineResult {
    pub result_id: String,
}

/// The single variant an update is dispatched as.
#[derive(Debug, Clone, Copy)]
pub enum UpdateVariant<'a> {
    Message { message: &'a Message, chat_id: i64 },
    ChosenInlineResult(&'a ChosenInlineResult),
    InlineQuery(&'a InlineQuery),
    CallbackQuery(&'a CallbackQuery),
    Unhandled,
}

impl UpdateVariant<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateVariant::Message { .. } => "message",
            UpdateVariant::ChosenInlineResult(_) => "chosen_inline_result",
            UpdateVariant::InlineQuery(_) => "inline_query",
            UpdateVariant::CallbackQuery(_) => "callback_query",
            UpdateVariant::Unhandled => "unhandled",
        }
    }
}

/// Pick exactly one variant. Order matters: a message with a chat wins over
/// everything else, then chosen results, inline queries and callbacks.
pub fn classify(update: &InboundUpdate) -> UpdateVariant<'_> {
    if let Some((message, chat_id)) = update
        .message
        .as_ref()
        .and_then(|m| m.chat_id().map(|id| (m, id)))
    {
        UpdateVariant::Message { message, chat_id }
    } else if let Some(chosen) = &update.chosen_inline_result {
        UpdateVariant::ChosenInlineResult(chosen)
    } else if let Some(query) = &update.inline_query {
        UpdateVariant::InlineQuery(query)
    } else if let Some(callback) = &update.callback_query {
        UpdateVariant::CallbackQuery(callback)
    } else {
        UpdateVariant::Unhandled
    }
}
