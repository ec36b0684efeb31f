pub mod disk;
pub mod memory;

use crate::rates::RateRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store backend error: {0}")]
    Backend(#[from] fjall::Error),
    #[error("record codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable table of rate records keyed by (currency, date).
#[async_trait]
pub trait RateStore: Send + Sync {
    /// Idempotent upsert. Re-writing an existing (currency, date) key
    /// overwrites the stored record.
    async fn put(&self, record: &RateRecord) -> Result<(), StoreError>;

    /// All records stored for `date`. A date with no records yields an
    /// empty list, not an error.
    async fn query(&self, date: NaiveDate) -> Result<Vec<RateRecord>, StoreError>;
}

/// Records for one day share a key prefix so `query` is a prefix scan.
pub(crate) fn record_key(currency: &str, date: NaiveDate) -> String {
    format!("{date}/{currency}")
}

pub(crate) fn date_prefix(date: NaiveDate) -> String {
    format!("{date}/")
}
