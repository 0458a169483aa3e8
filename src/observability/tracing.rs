use tracing::Span;
use tracing_subscriber::EnvFilter;
use crate::types::ChatId;

/// Installs the global subscriber. `RUST_LOG` wins over the default filter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,funding_alert_bot=info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

pub fn trace_alert_cycle(trigger: &str) -> Span {
    tracing::info_span!(
        "alert_cycle",
        trigger = %trigger,
    )
}

pub fn trace_command(command: &str, chat_id: Option<&ChatId>) -> Span {
    tracing::info_span!(
        "command",
        command = %command,
        chat_id = %chat_id.map(ChatId::as_str).unwrap_or("-"),
    )
}
