use crate::types::RankedEntry;

/// Entries whose magnitude strictly exceeds `threshold_percent`, in input order.
pub fn filter_above_threshold(ranked: &[RankedEntry], threshold_percent: f64) -> Vec<RankedEntry> {
    ranked.iter()
        .filter(|e| e.abs_rate_percent > threshold_percent)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::funding::ranker::{rank, RankMode};
    use crate::types::RateRecord;
    use proptest::prelude::*;

    #[test]
    fn keeps_entries_above_threshold() {
        let records = vec![
            RateRecord::new("BTC", 0.002),
            RateRecord::new("ETH", -0.02),
            RateRecord::new("XRP", 0.015),
        ];
        let ranked = rank(&records, RankMode::Absolute, 3);

        let filtered = filter_above_threshold(&ranked, 1.0);
        let symbols: Vec<_> = filtered.iter().map(|e| e.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "XRP"]);
    }

    #[test]
    fn comparison_is_strict() {
        let entry = RankedEntry {
            symbol: "EDGE".to_string(),
            signed_rate_percent: -1.5,
            abs_rate_percent: 1.5,
        };
        assert!(filter_above_threshold(std::slice::from_ref(&entry), 1.5).is_empty());
        assert_eq!(filter_above_threshold(&[entry], 1.4999).len(), 1);
    }

    proptest! {
        #[test]
        fn output_is_a_subset_above_threshold(
            rates in prop::collection::vec(-0.05f64..0.05, 0..30),
            threshold in 0.0f64..5.0,
        ) {
            let ranked: Vec<RankedEntry> = rates.iter().enumerate()
                .map(|(i, r)| RankedEntry::from_record(&RateRecord::new(format!("S{}", i), *r)))
                .collect();

            let filtered = filter_above_threshold(&ranked, threshold);
            prop_assert!(filtered.len() <= ranked.len());
            for entry in &filtered {
                prop_assert!(entry.abs_rate_percent > threshold);
                prop_assert!(ranked.contains(entry));
            }
            let expected = ranked.iter().filter(|e| e.abs_rate_percent > threshold).count();
            prop_assert_eq!(filtered.len(), expected);
        }
    }
}
