pub mod mexc;
pub mod retry;

use serde::Deserialize;
use crate::error::{Error, Result};
use crate::types::RateRecord;

pub use mexc::MexcRateFetcher;
pub use retry::RetryPolicy;

/// `{ success, code, data: [...] }` wrapper returned by the contract API.
#[derive(Clone, Debug, Deserialize)]
pub struct FundingRateEnvelope {
    pub success: bool,
    pub code: i64,
    #[serde(default)]
    pub data: Option<Vec<RawRateItem>>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RawRateItem {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, rename = "fundingRate")]
    pub funding_rate: Option<RawNumber>,
}

/// The API publishes rates both as JSON numbers and numeric strings.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Number(f64),
    Text(String),
}

impl FundingRateEnvelope {
    pub fn into_records(self) -> Result<Vec<RateRecord>> {
        if !self.success || self.code != 0 {
            return Err(Error::EnvelopeRejected {
                success: self.success,
                code: self.code,
            });
        }

        Ok(self.data
            .unwrap_or_default()
            .into_iter()
            .map(RawRateItem::into_record)
            .collect())
    }
}

impl RawRateItem {
    fn into_record(self) -> RateRecord {
        let symbol = self.symbol.unwrap_or_else(|| "N/A".to_string());

        let rate = match self.funding_rate {
            Some(RawNumber::Number(v)) => v,
            Some(RawNumber::Text(s)) => s.trim().parse().unwrap_or_else(|_| {
                tracing::warn!("Unparseable funding rate for {}: {:?}", symbol, s);
                0.0
            }),
            None => 0.0,
        };

        RateRecord::new(symbol, rate)
    }
}

pub fn parse_envelope(body: &[u8]) -> Result<Vec<RateRecord>> {
    let envelope: FundingRateEnvelope = serde_json::from_slice(body)
        .map_err(|e| Error::DeserializationError(e.to_string()))?;
    envelope.into_records()
}
