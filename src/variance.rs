//! Day-over-day rate comparison.

use crate::rates::RateRecord;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Signed delta per currency between two record sets, today minus yesterday.
///
/// Defined only on the intersection of currency codes: a currency present on
/// just one of the two days is left out entirely, not zero-filled. Decimal
/// arithmetic keeps small fractional rates exact.
pub fn variance(today: &[RateRecord], yesterday: &[RateRecord]) -> BTreeMap<String, Decimal> {
    let prior: HashMap<&str, Decimal> = yesterday
        .iter()
        .map(|record| (record.currency.as_str(), record.rate))
        .collect();

    today
        .iter()
        .filter_map(|record| {
            prior
                .get(record.currency.as_str())
                .map(|prev| (record.currency.clone(), record.rate - *prev))
        })
        .collect()
}
