pub mod client;
pub mod update;

pub use client::TelegramClient;
pub use update::Update;

/// Header Telegram echoes back when a webhook secret was registered.
pub const SECRET_TOKEN_HEADER: &str = "X-Telegram-Bot-Api-Secret-Token";
