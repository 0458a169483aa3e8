use std::time::Duration;
use serde::{Deserialize, Serialize};
use crate::query::QueryMode;
use crate::funding::RankMode;

pub mod loader;
pub mod schedule;

pub use loader::AppConfig;
pub use schedule::ScheduleConfig;

pub const DEFAULT_FUNDING_RATE_URL: &str = "https://contract.mexc.com/api/v1/contract/funding_rate";

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            url: DEFAULT_FUNDING_RATE_URL.to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            retry_delay_secs: 5,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct RankingConfig {
    pub top_k: usize,
    pub mode: RankMode,
}

impl Default for RankingConfig {
    fn default() -> Self {
        RankingConfig {
            top_k: crate::DEFAULT_TOP_K,
            mode: RankMode::Absolute,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    pub enabled: bool,
    pub threshold_percent: f64,
    pub prime_cache_on_start: bool,
    pub schedule: ScheduleConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        AlertConfig {
            enabled: true,
            threshold_percent: 1.5,  // 1.5%
            prime_cache_on_start: true,
            schedule: ScheduleConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    pub mode: QueryMode,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Recipient of scheduled alerts.
    pub chat_id: String,
    pub api_base: String,
    /// Public base URL; `/webhook` is appended on registration.
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub request_timeout_secs: u64,
}

impl TelegramConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        TelegramConfig {
            bot_token: String::new(),
            chat_id: String::new(),
            api_base: "https://api.telegram.org".to_string(),
            webhook_url: None,
            webhook_secret: None,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: 10000,
            request_timeout_secs: 30,
        }
    }
}
