use serde::{Deserialize, Serialize};
use crate::types::funding_rate::FundingRate;

/// One traded pair as returned by the funding-rate endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub symbol: String,
    pub funding_rate: FundingRate,
}

impl RateRecord {
    pub fn new(symbol: impl Into<String>, funding_rate: f64) -> Self {
        RateRecord {
            symbol: symbol.into(),
            funding_rate: FundingRate::from_f64(funding_rate),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub symbol: String,
    pub signed_rate_percent: f64,
    pub abs_rate_percent: f64,
}

impl RankedEntry {
    pub fn from_record(record: &RateRecord) -> Self {
        let percent = record.funding_rate.to_percent();
        RankedEntry {
            symbol: record.symbol.clone(),
            signed_rate_percent: percent,
            abs_rate_percent: percent.abs(),
        }
    }
}

/// Top-K entries in ranking order.
pub type RankedResult = Vec<RankedEntry>;
