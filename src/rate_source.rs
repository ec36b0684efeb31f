//! Provides the daily rate table for the application.

use crate::rates::RateMap;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected HTTP status: {0}")]
    Status(reqwest::StatusCode),
    /// The page came back but the expected rate table is not in it. Usually
    /// means the source page was redesigned rather than being down.
    #[error("rate table not found in source page")]
    TableMissing,
}

#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<RateMap, FetchError>;
}
