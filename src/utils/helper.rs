use chrono::{DateTime, Utc};
use crate::types::RankedEntry;

/// `"{rank}. {symbol}: {signed}% (abs: {abs}%)"`, rank starting at 1.
pub fn format_entry(rank: usize, entry: &RankedEntry) -> String {
    format!(
        "{}. {}: {:.4}% (abs: {:.4}%)",
        rank, entry.symbol, entry.signed_rate_percent, entry.abs_rate_percent
    )
}

pub fn format_entries(entries: &[RankedEntry]) -> String {
    entries.iter()
        .enumerate()
        .map(|(i, e)| format_entry(i + 1, e))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
