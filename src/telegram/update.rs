use serde::Deserialize;
use crate::commands::CommandEvent;
use crate::query::REQUERY_CALLBACK;
use crate::types::{CallbackId, ChatId, MessageId};

/// Subset of the Bot API `Update` object this bot reacts to.
#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub data: Option<String>,
    /// Absent when the originating message is too old.
    #[serde(default)]
    pub message: Option<Message>,
}

impl Update {
    /// Maps the update onto a bot command. Anything else yields `None`.
    pub fn into_command(self) -> Option<CommandEvent> {
        if let Some(query) = self.callback_query {
            return Some(callback_command(query));
        }

        let message = self.message?;
        let chat_id = ChatId::from(message.chat.id);
        match command_name(message.text.as_deref()?)? {
            "start" => Some(CommandEvent::Start { chat_id }),
            "funding" => Some(CommandEvent::Funding { chat_id }),
            _ => None,
        }
    }
}

fn callback_command(query: CallbackQuery) -> CommandEvent {
    let callback_id = CallbackId::new(query.id);
    match (query.data.as_deref(), query.message) {
        (Some(REQUERY_CALLBACK), Some(message)) => CommandEvent::Requery {
            chat_id: ChatId::from(message.chat.id),
            message_id: MessageId(message.message_id),
            callback_id,
        },
        _ => CommandEvent::UnknownCallback { callback_id },
    }
}

// "/funding@SomeBot extra" -> "funding"
fn command_name(text: &str) -> Option<&str> {
    let first = text.split_whitespace().next()?;
    let command = first.strip_prefix('/')?;
    let name = command.split('@').next().unwrap_or(command);
    if name.is_empty() { None } else { Some(name) }
}
