use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::Result;
use crate::types::{CallbackId, ChatId, MessageId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        InlineButton {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Outbound side of the chat transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<MessageId>;

    async fn edit_message(
        &self,
        chat_id: &ChatId,
        message_id: MessageId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &CallbackId) -> Result<()>;
}
