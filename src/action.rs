use serde_json::{json, Value};

/// Outbound command produced for one request.
///
/// `None` is an explicit no-op so callers always get a well-formed value.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundAction {
    None,
    SendText(SendText),
    AnswerInlineQuery(AnswerInlineQuery),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendText {
    pub chat_id: i64,
    pub text: String,
    pub disable_link_preview: bool,
    pub reply_to_message_id: Option<i32>,
}

impl SendText {
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            disable_link_preview: false,
            reply_to_message_id: None,
        }
    }

    pub fn reply_to(mut self, message_id: Option<i32>) -> Self {
        self.reply_to_message_id = message_id;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnswerInlineQuery {
    pub inline_query_id: String,
    pub results: Vec<InlineResultArticle>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InlineResultArticle {
    pub id: String,
    pub url: String,
    pub title: String,
    pub hide_url: bool,
    pub message_text: String,
    pub disable_link_preview: bool,
}

impl OutboundAction {
    pub fn send_text(chat_id: i64, text: impl Into<String>) -> Self {
        OutboundAction::SendText(SendText::new(chat_id, text))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, OutboundAction::None)
    }

    /// Chat the action is addressed to, if any.
    pub fn chat_id(&self) -> Option<i64> {
        match self {
            OutboundAction::SendText(send) => Some(send.chat_id),
            _ => None,
        }
    }

    /// Bot API method name and JSON body, or `None` for the no-op.
    pub fn to_api_call(&self) -> Option<(&'static str, Value)> {
        match self {
            OutboundAction::None => None,
            OutboundAction::SendText(send) => {
                let mut body = json!({
                    "chat_id": send.chat_id,
                    "text": send.text,
                });
                if send.disable_link_preview {
                    body["link_preview_options"] = json!({ "is_disabled": true });
                }
                if let Some(reply_to) = send.reply_to_message_id {
                    body["reply_parameters"] = json!({
                        "message_id": reply_to,
                        "allow_sending_without_reply": true,
                    });
                }
                Some(("sendMessage", body))
            }
            OutboundAction::AnswerInlineQuery(answer) => {
                let results: Vec<Value> = answer
                    .results
                    .iter()
                    .map(|article| {
                        json!({
                            "type": "article",
                            "id": article.id,
                            "title": article.title,
                            "url": article.url,
                            "hide_url": article.hide_url,
                            "input_message_content": {
                                "message_text": article.message_text,
                                "link_preview_options": {
                                    "is_disabled": article.disable_link_preview,
                                },
                            },
                        })
                    })
                    .collect();
                Some((
                    "answerInlineQuery",
                    json!({
                        "inline_query_id": answer.inline_query_id,
                        "results": results,
                    }),
                ))
            }
        }
    }
}
