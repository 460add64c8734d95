use anyhow::Context;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{SentMessage, TelegramFile, Transport};
use crate::action::OutboundAction;
use crate::error::{DispatchError, DispatchResult};
use crate::storage::blacklist::BlacklistStore;

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i32,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    file_path: Option<String>,
}

/// Numeric bot id, the part of the token before the colon
fn bot_id(token: &str) -> &str {
    token.split(':').next().unwrap_or(token)
}

/// Bot API client. The token is supplied per call since one process serves
/// several bots.
pub struct TelegramApi {
    client: reqwest::Client,
    api_url: String,
    blacklist: BlacklistStore,
}

impl TelegramApi {
    pub fn new(api_url: &str, blacklist: BlacklistStore) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            blacklist,
        }
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, token, method)
    }

    fn file_url(&self, token: &str, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.api_url, token, file_path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        token: &str,
        method: &str,
        body: &serde_json::Value,
        chat_id: Option<i64>,
    ) -> DispatchResult<T> {
        debug!("Calling Telegram method {}", method);

        let response = self
            .client
            .post(self.method_url(token, method))
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request to Telegram", method))?;

        let status = response.status();
        let parsed: ApiResponse<T> = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response ({})", method, status))?;

        if parsed.ok {
            return parsed
                .result
                .with_context(|| format!("Telegram returned no result for {}", method))
                .map_err(DispatchError::from);
        }

        let description = parsed.description.unwrap_or_default();
        let code = parsed.error_code.unwrap_or(status.as_u16());

        // 403 means the bot was blocked, kicked or the user is gone
        if let (403, Some(chat_id)) = (code, chat_id) {
            info!("Blacklisting chat {}: {}", chat_id, description);
            self.blacklist
                .add(bot_id(token), chat_id, &description)
                .await?;
            return Err(DispatchError::Blacklisted { chat_id });
        }

        Err(anyhow::anyhow!("Telegram API error ({}) on {}: {}", code, method, description).into())
    }
}

#[async_trait]
impl Transport for TelegramApi {
    async fn deliver(
        &self,
        action: &OutboundAction,
        token: &str,
    ) -> DispatchResult<Option<SentMessage>> {
        let Some((method, body)) = action.to_api_call() else {
            debug!("No-op action, nothing to deliver");
            return Ok(None);
        };

        let chat_id = action.chat_id();
        if let Some(chat_id) = chat_id {
            if self.blacklist.contains(bot_id(token), chat_id).await? {
                return Err(DispatchError::Blacklisted { chat_id });
            }
        }

        match action {
            OutboundAction::SendText(_) => {
                let message: ApiMessage = self.call(token, method, &body, chat_id).await?;
                debug!("Delivered message {}", message.message_id);
                Ok(Some(SentMessage {
                    message_id: message.message_id,
                }))
            }
            _ => {
                let _: bool = self.call(token, method, &body, chat_id).await?;
                Ok(None)
            }
        }
    }

    async fn retrieve_file(&self, file_id: &str, token: &str) -> DispatchResult<TelegramFile> {
        let file: ApiFile = self
            .call(
                token,
                "getFile",
                &serde_json::json!({ "file_id": file_id }),
                None,
            )
            .await?;
        let file_path = file
            .file_path
            .with_context(|| format!("File {} has no download path", file_id))?;

        let response = self
            .client
            .get(self.file_url(token, &file_path))
            .send()
            .await
            .context("Failed to download file from Telegram")?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("Telegram file download failed ({})", status).into());
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read downloaded file")?;
        debug!("Downloaded {} ({} bytes)", file_path, bytes.len());

        Ok(TelegramFile {
            file_path,
            bytes: bytes.to_vec(),
        })
    }
}
