use thiserror::Error;

/// Failure modes of the dispatch chain.
///
/// `Blacklisted` is a control outcome rather than a fault: the chat opted out
/// (or blocked the bot) and the request must end quietly with a 200.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("chat {chat_id} is blacklisted")]
    Blacklisted { chat_id: i64 },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DispatchResult<T> = std::result::Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_errors_convert_to_other() {
        let err: DispatchError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, DispatchError::Other(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_blacklisted_display_names_chat() {
        let err = DispatchError::Blacklisted { chat_id: 42 };
        assert_eq!(err.to_string(), "chat 42 is blacklisted");
    }
}
