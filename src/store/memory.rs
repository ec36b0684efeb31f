use super::{RateStore, StoreError, date_prefix, record_key};
use crate::rates::RateRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// In-memory store implementation using BTreeMap and Mutex. Shares the key
/// layout of the durable store so both behave identically under `query`.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<BTreeMap<String, RateRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RateStore for MemoryStore {
    async fn put(&self, record: &RateRecord) -> Result<(), StoreError> {
        let key = record_key(&record.currency, record.date);
        let mut table = self.inner.lock().await;
        debug!("Store PUT for key: {}", key);
        table.insert(key, record.clone());
        Ok(())
    }

    async fn query(&self, date: NaiveDate) -> Result<Vec<RateRecord>, StoreError> {
        let prefix = date_prefix(date);
        let table = self.inner.lock().await;
        let records = table
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .map(|(_, record)| record.clone())
            .collect();
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(currency: &str, rate: &str, date: NaiveDate) -> RateRecord {
        RateRecord {
            currency: currency.to_string(),
            currency_name: format!("{currency} name"),
            rate: rate.parse().unwrap(),
            date,
        }
    }

    #[tokio::test]
    async fn test_put_then_query() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        store.put(&record("USD", "1.0856", date)).await.unwrap();

        let records = store.query(date).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].currency, "USD");
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        store.put(&record("USD", "1.0800", date)).await.unwrap();
        store.put(&record("USD", "1.0856", date)).await.unwrap();

        let records = store.query(date).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].rate, "1.0856".parse().unwrap());
    }

    #[tokio::test]
    async fn test_query_empty_date() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();

        assert!(store.query(date).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_query_filters_by_exact_date() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let yesterday = today.pred_opt().unwrap();

        store.put(&record("USD", "1.0856", today)).await.unwrap();
        store.put(&record("USD", "1.0800", yesterday)).await.unwrap();
        store.put(&record("JPY", "160.12", yesterday)).await.unwrap();

        let records = store.query(yesterday).await.unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.date == yesterday));
    }
}
