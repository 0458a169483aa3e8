use std::sync::Arc;
use crate::error::Result;
use crate::interfaces::messenger::Messenger;
use crate::observability::metrics::{ALERTS_SENT, DISPATCH_FAILURES};
use crate::types::{ChatId, RankedEntry};
use crate::utils::helper::format_entries;

/// Sends one alert message per cycle to a fixed recipient.
pub struct NotificationDispatcher {
    messenger: Arc<dyn Messenger>,
    chat_id: ChatId,
    threshold_percent: f64,
}

impl NotificationDispatcher {
    pub fn new(messenger: Arc<dyn Messenger>, chat_id: ChatId, threshold_percent: f64) -> Self {
        NotificationDispatcher {
            messenger,
            chat_id,
            threshold_percent,
        }
    }

    pub fn format_alert(&self, entries: &[RankedEntry]) -> String {
        format!(
            "Funding rate alert: |rate| above {:.2}%\n\n{}",
            self.threshold_percent,
            format_entries(entries)
        )
    }

    /// Best-effort send; the caller decides what a failure means.
    pub async fn dispatch(&self, entries: &[RankedEntry]) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let text = self.format_alert(entries);
        match self.messenger.send_message(&self.chat_id, &text, &[]).await {
            Ok(message_id) => {
                ALERTS_SENT.inc();
                tracing::info!("Alert sent to {} (message {}): {} entries", self.chat_id, message_id, entries.len());
                Ok(())
            }
            Err(e) => {
                DISPATCH_FAILURES.inc();
                Err(e)
            }
        }
    }
}
