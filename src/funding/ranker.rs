use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use crate::types::{RankedEntry, RankedResult, RateRecord};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMode {
    /// Highest positive rate first.
    Signed,
    /// Largest magnitude first, regardless of sign.
    #[default]
    Absolute,
}

impl RankMode {
    fn key(&self, record: &RateRecord) -> f64 {
        match self {
            RankMode::Signed => record.funding_rate.to_f64(),
            RankMode::Absolute => record.funding_rate.abs(),
        }
    }
}

/// Top `k` records under `mode`, descending. `sort_by` is stable, so equal
/// keys keep their fetch order. NaN keys sort after every real value.
pub fn rank(records: &[RateRecord], mode: RankMode, k: usize) -> RankedResult {
    let mut keyed: Vec<(f64, &RateRecord)> = records.iter()
        .map(|r| (mode.key(r), r))
        .collect();

    keyed.sort_by(|a, b| descending(a.0, b.0));

    keyed.into_iter()
        .take(k)
        .map(|(_, r)| RankedEntry::from_record(r))
        .collect()
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
