use async_trait::async_trait;
use reqwest::StatusCode;
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use crate::interfaces::rate_source::RateSource;
use crate::market_data::{parse_envelope, RetryPolicy};
use crate::observability::metrics::{FETCH_FAILURES, FETCH_LATENCY};
use crate::types::RateRecord;

pub struct MexcRateFetcher {
    source_id: String,
    url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl MexcRateFetcher {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(MexcRateFetcher {
            source_id: "mexc".to_string(),
            url: config.url.clone(),
            client,
            retry: RetryPolicy::new(config.max_attempts, config.retry_delay()),
        })
    }

    async fn fetch_once(&self) -> Result<Vec<RateRecord>> {
        let timer = FETCH_LATENCY.start_timer();

        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(Error::UnexpectedStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let records = parse_envelope(&body)?;
        timer.observe_duration();

        tracing::debug!("Fetched {} funding rates from {}", records.len(), self.source_id);
        Ok(records)
    }
}

#[async_trait]
impl RateSource for MexcRateFetcher {
    async fn fetch(&self) -> Result<Vec<RateRecord>> {
        let result = self.retry.run("funding rate fetch", |_| self.fetch_once()).await;
        if result.is_err() {
            FETCH_FAILURES.inc();
        }
        result
    }

    fn source_id(&self) -> &str {
        &self.source_id
    }
}
