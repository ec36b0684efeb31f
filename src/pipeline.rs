//! End-to-end daily run: fetch, persist, query, compute.

use crate::rate_source::{FetchError, RateSource};
use crate::rates::{RateMap, RateRecord};
use crate::store::{RateStore, StoreError};
use crate::variance::variance;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Failed to fetch exchange rates")]
    SourceUnavailable(#[source] FetchError),
    #[error("Failed to store exchange rates")]
    PersistFailure(#[source] StoreError),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::SourceUnavailable(_) => "SOURCE_UNAVAILABLE",
            PipelineError::PersistFailure(_) => "PERSIST_FAILURE",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub today_rates: Vec<RateRecord>,
    pub variance: BTreeMap<String, Decimal>,
}

/// Invocation result in the shape the hosting trigger expects.
#[derive(Debug, Serialize)]
pub struct Response {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: serde_json::Value,
}

pub struct Pipeline<'a> {
    source: &'a dyn RateSource,
    store: &'a dyn RateStore,
}

impl<'a> Pipeline<'a> {
    pub fn new(source: &'a dyn RateSource, store: &'a dyn RateStore) -> Self {
        Pipeline { source, store }
    }

    /// Runs the four stages for `today`. A fetch or persist failure aborts
    /// the run; already-committed writes stay put, since re-running the
    /// invocation is the recovery path and writes are idempotent. A store
    /// read failure degrades to an empty record set instead of aborting.
    pub async fn run(&self, today: NaiveDate) -> Result<RunReport, PipelineError> {
        let yesterday = today.pred_opt().unwrap_or(today);

        let fetched = self
            .source
            .fetch()
            .await
            .map_err(PipelineError::SourceUnavailable)?;
        info!("Fetched {} rates for {}", fetched.len(), today);

        for record in to_records(fetched, today) {
            self.store
                .put(&record)
                .await
                .map_err(PipelineError::PersistFailure)?;
        }

        let today_rates = self.query_or_empty(today).await;
        let yesterday_rates = self.query_or_empty(yesterday).await;

        let variance = variance(&today_rates, &yesterday_rates);
        debug!("Computed variance for {} currencies", variance.len());

        Ok(RunReport {
            today_rates,
            variance,
        })
    }

    async fn query_or_empty(&self, date: NaiveDate) -> Vec<RateRecord> {
        match self.store.query(date).await {
            Ok(records) => records,
            Err(e) => {
                warn!("Store read failed for {date}, treating as empty: {e}");
                Vec::new()
            }
        }
    }

    /// Entry point for the scheduled trigger. Never propagates an error:
    /// every failure becomes a 500 payload with a short message and an
    /// error code, with no partial result mixed in.
    pub async fn handle(&self, _event: serde_json::Value, today: NaiveDate) -> Response {
        match self.run(today).await {
            Ok(report) => Response {
                status_code: 200,
                body: json!({
                    "today_rates": report.today_rates,
                    "variance": report.variance,
                }),
            },
            Err(e) => {
                error!(code = e.code(), error = %e, "Pipeline run failed");
                Response {
                    status_code: 500,
                    body: json!({
                        "error": e.to_string(),
                        "code": e.code(),
                    }),
                }
            }
        }
    }
}

/// Builds today's records from the fetched table, in sorted currency order
/// so persist order is deterministic. Rows whose rate does not parse as a
/// non-negative decimal are dropped, matching the row-level tolerance for
/// source-format noise.
fn to_records(fetched: RateMap, date: NaiveDate) -> Vec<RateRecord> {
    let mut records: Vec<RateRecord> = fetched
        .into_iter()
        .filter_map(|(currency, row)| match row.rate.parse::<Decimal>() {
            Ok(rate) if !rate.is_sign_negative() => Some(RateRecord {
                currency,
                currency_name: row.currency_name,
                rate,
                date,
            }),
            Ok(rate) => {
                warn!("Dropping negative rate {rate} for {currency}");
                None
            }
            Err(e) => {
                warn!("Dropping unparseable rate for {currency}: {e}");
                None
            }
        })
        .collect();
    records.sort_by(|a, b| a.currency.cmp(&b.currency));
    records
}
