pub mod worker;

use crate::types::{CallbackId, ChatId, MessageId};

pub use worker::CommandWorker;

pub const WELCOME_TEXT: &str =
    "Welcome to the funding rate bot!\nTap the button below to see the current top funding rates.";
pub const LOADING_TEXT: &str = "Fetching funding rates...";

/// Inbound chat interaction, decoded from the transport.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandEvent {
    Start { chat_id: ChatId },
    Funding { chat_id: ChatId },
    /// Re-query button pressed under an earlier reply.
    Requery {
        chat_id: ChatId,
        message_id: MessageId,
        callback_id: CallbackId,
    },
    /// Button press this bot does not recognise; only acknowledged.
    UnknownCallback { callback_id: CallbackId },
}

impl CommandEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CommandEvent::Start { .. } => "start",
            CommandEvent::Funding { .. } => "funding",
            CommandEvent::Requery { .. } => "requery",
            CommandEvent::UnknownCallback { .. } => "unknown_callback",
        }
    }

    pub fn chat_id(&self) -> Option<&ChatId> {
        match self {
            CommandEvent::Start { chat_id }
            | CommandEvent::Funding { chat_id }
            | CommandEvent::Requery { chat_id, .. } => Some(chat_id),
            CommandEvent::UnknownCallback { .. } => None,
        }
    }
}
