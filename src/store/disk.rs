use super::{RateStore, StoreError, date_prefix, record_key};
use crate::rates::RateRecord;
use async_trait::async_trait;
use chrono::NaiveDate;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

/// Durable store backed by a fjall partition. Each record is one key-value
/// entry, fsynced on write so a completed run survives process death.
pub struct FjallStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl FjallStore {
    pub fn open(path: &Path, table_name: &str) -> Result<Self, StoreError> {
        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition(table_name, PartitionCreateOptions::default())?;
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

#[async_trait]
impl RateStore for FjallStore {
    async fn put(&self, record: &RateRecord) -> Result<(), StoreError> {
        let key = record_key(&record.currency, record.date);
        self.partition.insert(&key, serde_json::to_vec(record)?)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Stored rate under {}", key);
        Ok(())
    }

    async fn query(&self, date: NaiveDate) -> Result<Vec<RateRecord>, StoreError> {
        let mut records = Vec::new();
        for entry in self.partition.prefix(date_prefix(date)) {
            let (_key, value) = entry?;
            records.push(serde_json::from_slice(&value)?);
        }
        debug!("Found {} records for {}", records.len(), date);
        Ok(records)
    }
}
