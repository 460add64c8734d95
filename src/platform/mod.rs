pub mod telegram;

use async_trait::async_trait;

use crate::action::OutboundAction;
use crate::error::DispatchResult;

/// A message the platform accepted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentMessage {
    pub message_id: i32,
}

/// A file fetched from the platform
#[derive(Debug, Clone)]
pub struct TelegramFile {
    /// Server-side path, e.g. "stickers/file_12.webp"
    pub file_path: String,
    pub bytes: Vec<u8>,
}

impl TelegramFile {
    /// Last path segment of `file_path`
    pub fn file_name(&self) -> &str {
        self.file_path
            .rsplit('/')
            .next()
            .unwrap_or(self.file_path.as_str())
    }
}

/// Outbound side of a bot: delivering actions and fetching attachments.
///
/// Both calls may report `DispatchError::Blacklisted`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver an action with the bot's token. Returns the sent message for
    /// `SendText`, `None` for everything else.
    async fn deliver(
        &self,
        action: &OutboundAction,
        token: &str,
    ) -> DispatchResult<Option<SentMessage>>;

    async fn retrieve_file(&self, file_id: &str, token: &str) -> DispatchResult<TelegramFile>;
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;
    use crate::error::DispatchError;

    /// Records deliveries instead of talking to Telegram.
    #[derive(Default)]
    pub struct FakeTransport {
        pub delivered: Mutex<Vec<(OutboundAction, String)>>,
        pub files: Mutex<Vec<(String, String)>>,
        pub blacklisted: HashSet<i64>,
        pub fail_delivery: bool,
        /// When set, every download reports this chat as blacklisted
        pub download_blacklisted: Option<i64>,
    }

    impl FakeTransport {
        pub fn with_file(file_id: &str, file_path: &str) -> Self {
            let fake = Self::default();
            fake.files
                .lock()
                .unwrap()
                .push((file_id.to_string(), file_path.to_string()));
            fake
        }

        pub fn blacklisting(chat_id: i64) -> Self {
            Self {
                blacklisted: HashSet::from([chat_id]),
                ..Self::default()
            }
        }

        pub fn blacklisting_downloads(chat_id: i64) -> Self {
            Self {
                download_blacklisted: Some(chat_id),
                ..Self::default()
            }
        }

        pub fn delivered(&self) -> Vec<(OutboundAction, String)> {
            self.delivered.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn deliver(
            &self,
            action: &OutboundAction,
            token: &str,
        ) -> DispatchResult<Option<SentMessage>> {
            if let Some(chat_id) = action.chat_id() {
                if self.blacklisted.contains(&chat_id) {
                    return Err(DispatchError::Blacklisted { chat_id });
                }
            }
            if self.fail_delivery {
                return Err(anyhow::anyhow!("Telegram API error (500): down").into());
            }
            let mut delivered = self.delivered.lock().unwrap();
            delivered.push((action.clone(), token.to_string()));
            match action {
                OutboundAction::SendText(_) => Ok(Some(SentMessage {
                    message_id: 1000 + delivered.len() as i32,
                })),
                _ => Ok(None),
            }
        }

        async fn retrieve_file(&self, file_id: &str, _token: &str) -> DispatchResult<TelegramFile> {
            if let Some(chat_id) = self.download_blacklisted {
                return Err(DispatchError::Blacklisted { chat_id });
            }
            let files = self.files.lock().unwrap();
            files
                .iter()
                .find(|(id, _)| id == file_id)
                .map(|(_, path)| TelegramFile {
                    file_path: path.clone(),
                    bytes: b"RIFF....WEBP".to_vec(),
                })
                .ok_or_else(|| anyhow::anyhow!("Bad Request: invalid file_id").into())
        }
    }
}
