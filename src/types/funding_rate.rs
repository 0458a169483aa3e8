use serde::{Deserialize, Serialize};

/// Fractional funding rate as published by the exchange (0.0123 = 1.23%).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FundingRate(f64);

impl FundingRate {
    pub fn from_f64(value: f64) -> Self {
        FundingRate(value)
    }

    pub fn zero() -> Self {
        FundingRate(0.0)
    }

    pub fn to_f64(&self) -> f64 {
        self.0
    }

    pub fn abs(&self) -> f64 {
        self.0.abs()
    }

    pub fn to_percent(&self) -> f64 {
        self.0 * crate::PERCENT_MULTIPLIER
    }
}

impl Default for FundingRate {
    fn default() -> Self {
        Self::zero()
    }
}
