use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Instrument;
use crate::commands::{CommandEvent, LOADING_TEXT, WELCOME_TEXT};
use crate::error::Result;
use crate::interfaces::messenger::{InlineButton, Messenger};
use crate::observability::metrics::COMMANDS_HANDLED;
use crate::observability::tracing::trace_command;
use crate::query::{OnDemandQueryHandler, REQUERY_CALLBACK};
use crate::types::{CallbackId, ChatId, MessageId};

/// Drains the inbound command queue; each event gets its own task.
pub struct CommandWorker {
    messenger: Arc<dyn Messenger>,
    query: Arc<OnDemandQueryHandler>,
}

impl CommandWorker {
    pub fn new(messenger: Arc<dyn Messenger>, query: Arc<OnDemandQueryHandler>) -> Self {
        CommandWorker { messenger, query }
    }

    pub async fn run(self: Arc<Self>, mut rx: mpsc::Receiver<CommandEvent>) {
        while let Some(event) = rx.recv().await {
            let worker = Arc::clone(&self);
            tokio::spawn(async move { worker.handle(event).await });
        }
        tracing::info!("Command queue closed, worker exiting");
    }

    pub async fn handle(&self, event: CommandEvent) {
        COMMANDS_HANDLED.with_label_values(&[event.name()]).inc();
        let span = trace_command(event.name(), event.chat_id());

        let result = async {
            match event {
                CommandEvent::Start { chat_id } => self.start(&chat_id).await,
                CommandEvent::Funding { chat_id } => self.funding(&chat_id).await,
                CommandEvent::Requery { chat_id, message_id, callback_id } => {
                    self.requery(&chat_id, message_id, &callback_id).await
                }
                CommandEvent::UnknownCallback { callback_id } => {
                    self.messenger.answer_callback(&callback_id).await
                }
            }
        }
        .instrument(span.clone())
        .await;

        if let Err(e) = result {
            span.in_scope(|| tracing::error!("Command reply failed: {}", e));
        }
    }

    async fn start(&self, chat_id: &ChatId) -> Result<()> {
        let button = InlineButton::new("Top funding rates", REQUERY_CALLBACK);
        self.messenger.send_message(chat_id, WELCOME_TEXT, &[button]).await?;
        Ok(())
    }

    async fn funding(&self, chat_id: &ChatId) -> Result<()> {
        let loading = self.messenger.send_message(chat_id, LOADING_TEXT, &[]).await?;
        let reply = self.query.handle().await;
        self.messenger.edit_message(chat_id, loading, &reply.text, &reply.buttons).await
    }

    async fn requery(&self, chat_id: &ChatId, message_id: MessageId, callback_id: &CallbackId) -> Result<()> {
        if let Err(e) = self.messenger.answer_callback(callback_id).await {
            tracing::warn!("Failed to acknowledge callback {}: {}", callback_id, e);
        }

        self.messenger.edit_message(chat_id, message_id, LOADING_TEXT, &[]).await?;
        let reply = self.query.handle().await;
        self.messenger.edit_message(chat_id, message_id, &reply.text, &reply.buttons).await
    }
}
