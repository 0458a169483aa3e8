use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use crate::config::TelegramConfig;
use crate::error::{Error, Result};
use crate::interfaces::messenger::{InlineButton, Messenger};
use crate::types::{CallbackId, ChatId, MessageId};

/// Bot API envelope: `{"ok": bool, "result": ..., "description": ...}`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(TelegramClient {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    // Request URLs embed the token, so transport errors are stripped of them.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: Value) -> Result<T> {
        let response = self.client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Http(e.without_url()))?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| Error::Http(e.without_url()))?;
        let envelope: ApiResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|_| Error::UnexpectedStatus(status.as_u16()))?;

        match envelope {
            ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
            ApiResponse { description, .. } => Err(Error::TelegramApi {
                description: description.unwrap_or_else(|| format!("{} failed with status {}", method, status)),
            }),
        }
    }

    /// Points Telegram at `{base_url}/webhook`.
    pub async fn set_webhook(&self, base_url: &str, secret: Option<&str>) -> Result<()> {
        let mut body = json!({
            "url": format!("{}/webhook", base_url.trim_end_matches('/')),
            "allowed_updates": ["message", "callback_query"],
        });
        if let Some(secret) = secret {
            body["secret_token"] = json!(secret);
        }

        self.call::<bool>("setWebhook", body).await?;
        tracing::info!("Webhook registered");
        Ok(())
    }

    pub async fn set_my_commands(&self) -> Result<()> {
        let body = json!({
            "commands": [
                { "command": "start", "description": "Show the welcome message" },
                { "command": "funding", "description": "Top funding rates right now" },
            ]
        });
        self.call::<bool>("setMyCommands", body).await?;
        Ok(())
    }

    pub async fn delete_webhook(&self) -> Result<()> {
        self.call::<bool>("deleteWebhook", json!({})).await?;
        tracing::info!("Webhook removed");
        Ok(())
    }
}

fn reply_markup(buttons: &[InlineButton]) -> Value {
    let rows: Vec<Value> = buttons
        .iter()
        .map(|b| json!([{ "text": b.text, "callback_data": b.callback_data }]))
        .collect();
    json!({ "inline_keyboard": rows })
}

fn is_not_modified(e: &Error) -> bool {
    matches!(e, Error::TelegramApi { description } if description.contains("message is not modified"))
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(
        &self,
        chat_id: &ChatId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<MessageId> {
        let mut body = json!({ "chat_id": chat_id.as_str(), "text": text });
        if !buttons.is_empty() {
            body["reply_markup"] = reply_markup(buttons);
        }

        let sent: SentMessage = self.call("sendMessage", body).await?;
        Ok(MessageId(sent.message_id))
    }

    async fn edit_message(
        &self,
        chat_id: &ChatId,
        message_id: MessageId,
        text: &str,
        buttons: &[InlineButton],
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id.as_str(),
            "message_id": message_id.0,
            "text": text,
        });
        if !buttons.is_empty() {
            body["reply_markup"] = reply_markup(buttons);
        }

        // Re-rendering identical text is rejected by the API; the message already shows it.
        match self.call::<Value>("editMessageText", body).await {
            Err(e) if is_not_modified(&e) => Ok(()),
            other => other.map(|_| ()),
        }
    }

    async fn answer_callback(&self, callback_id: &CallbackId) -> Result<()> {
        self.call::<bool>("answerCallbackQuery", json!({ "callback_query_id": callback_id.as_str() }))
            .await?;
        Ok(())
    }
}
