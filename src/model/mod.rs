//! The stored prayer request and the `PrayerStore` seam the web layer writes through.
//! `DbManager` (MongoDB) is the production store, `MemoryStore` is used locally and in tests.

use std::sync::Mutex;

use async_trait::async_trait;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

/// A prayer request as persisted in the `prayer-requests` collection.
/// `user` holds the canonical identifier (email) of the signed-in submitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrayerRecord {
    pub name: String,
    pub email: String,
    pub prayer: String,
    pub date: DateTime,
    pub user: String,
}

#[async_trait]
pub trait PrayerStore: Send + Sync {
    /// Inserts exactly one record.
    async fn insert(&self, record: &PrayerRecord) -> Result<()>;

    /// Releases any held connections. Called once after the server stops.
    async fn shutdown(&self) {}
}

/// Keeps records in process memory. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<PrayerRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of all inserted records, oldest first.
    pub fn records(&self) -> Vec<PrayerRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PrayerStore for MemoryStore {
    #[tracing::instrument(name = "insert_prayer_memory", skip_all)]
    async fn insert(&self, record: &PrayerRecord) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| Error::StoreUnavailable("memory store lock poisoned".to_string()))?
            .push(record.clone());
        Ok(())
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("prayer store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}
