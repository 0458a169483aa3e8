use crate::config::*;
use crate::error::{Error, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    pub ranking: RankingConfig,
    pub alert: AlertConfig,
    pub query: QueryConfig,
    pub telegram: TelegramConfig,
    pub server: ServerConfig,
}

/// `FUNDING_BOT__SECTION__KEY` overrides, e.g. `FUNDING_BOT__TELEGRAM__BOT_TOKEN`.
fn environment() -> Environment {
    Environment::with_prefix("FUNDING_BOT").separator("__")
}

impl AppConfig {
    pub fn load(env: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(environment())
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let app: AppConfig = config.try_deserialize()
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(Error::ConfigError("telegram.bot_token is required".to_string()));
        }
        if self.alert.enabled && self.telegram.chat_id.trim().is_empty() {
            return Err(Error::ConfigError("telegram.chat_id is required when alerts are enabled".to_string()));
        }
        if self.ranking.top_k == 0 {
            return Err(Error::ConfigError("ranking.top_k must be positive".to_string()));
        }
        if self.upstream.max_attempts == 0 {
            return Err(Error::ConfigError("upstream.max_attempts must be positive".to_string()));
        }
        if !self.alert.threshold_percent.is_finite() {
            return Err(Error::ConfigError("alert.threshold_percent must be finite".to_string()));
        }

        self.alert.schedule.to_trigger_schedule()
            .map_err(|e| Error::ConfigError(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::QueryMode;
    use crate::funding::RankMode;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<AppConfig> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| Error::ConfigError(e.to_string()))?;
        AppConfig::from_config(config)
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg = from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = "-1001"
            "#,
        ).unwrap();

        assert_eq!(cfg.upstream.url, DEFAULT_FUNDING_RATE_URL);
        assert_eq!(cfg.upstream.max_attempts, 3);
        assert_eq!(cfg.ranking.top_k, 3);
        assert_eq!(cfg.ranking.mode, RankMode::Absolute);
        assert_eq!(cfg.alert.threshold_percent, 1.5);
        assert_eq!(cfg.query.mode, QueryMode::FetchIfEmpty);
        assert_eq!(cfg.server.port, 10000);
    }

    #[test]
    fn parses_interval_schedule_and_modes() {
        let cfg = from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = "@alerts"

            [ranking]
            mode = "signed"
            top_k = 5

            [query]
            mode = "always_fetch"

            [alert.schedule]
            type = "interval"
            every_secs = 600
            "#,
        ).unwrap();

        assert_eq!(cfg.ranking.mode, RankMode::Signed);
        assert_eq!(cfg.ranking.top_k, 5);
        assert_eq!(cfg.query.mode, QueryMode::AlwaysFetch);
        assert!(matches!(cfg.alert.schedule, ScheduleConfig::Interval { every_secs: 600 }));
    }

    #[test]
    fn environment_overrides_switch_to_an_interval_schedule() {
        let vars: config::Map<String, String> = [
            ("FUNDING_BOT__TELEGRAM__BOT_TOKEN", "123:abc"),
            ("FUNDING_BOT__TELEGRAM__CHAT_ID", "-1001"),
            ("FUNDING_BOT__ALERT__SCHEDULE__TYPE", "interval"),
            ("FUNDING_BOT__ALERT__SCHEDULE__EVERY_SECS", "600"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::builder()
            .add_source(File::from_str(include_str!("../../config/default.toml"), FileFormat::Toml))
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap();
        let cfg = AppConfig::from_config(config).unwrap();

        assert_eq!(cfg.telegram.bot_token, "123:abc");
        assert_eq!(cfg.telegram.chat_id, "-1001");
        assert!(matches!(cfg.alert.schedule, ScheduleConfig::Interval { every_secs: 600 }));
        assert_eq!(
            cfg.alert.schedule.to_trigger_schedule().unwrap(),
            crate::alerts::TriggerSchedule::every(std::time::Duration::from_secs(600)).unwrap()
        );
    }

    #[test]
    fn missing_token_is_rejected() {
        let err = from_toml("[server]\nport = 8080\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let err = from_toml(
            r#"
            [telegram]
            bot_token = "123:abc"
            chat_id = "1"

            [ranking]
            top_k = 0
            "#,
        ).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
