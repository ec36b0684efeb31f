//! Core data model for fetched and persisted exchange rates.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single row from the source rate table, before a date is attached.
///
/// The rate stays a string here; it is validated and parsed into a decimal
/// when today's records are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedRate {
    pub currency_name: String,
    pub rate: String,
}

/// Fetched rates keyed by currency code. A repeated code keeps the last row.
pub type RateMap = HashMap<String, FetchedRate>;

/// One persisted exchange rate for a currency on a calendar day.
///
/// Records are written once and never mutated. `rate` is a non-negative
/// finite decimal and serializes as a string; `date` serializes as an
/// ISO 8601 date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub currency: String,
    pub currency_name: String,
    pub rate: Decimal,
    pub date: NaiveDate,
}
