//! In-process session store for local runs and tests.
//! Unlike `tower_sessions::MemoryStore` it drops expired records, `sweep_expired` runs that
//! periodically. Production uses Redis, which expires keys on its own.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tower_sessions::{
    cookie::time::OffsetDateTime,
    session::{Id, Record},
    session_store, ExpiredDeletion, SessionStore,
};
use tracing::debug;

#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Arc<Mutex<HashMap<Id, Record>>>);

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deletes expired records every `period` until the task is aborted.
    pub async fn sweep_expired(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if let Err(er) = self.delete_expired().await {
                tracing::error!("failed to delete expired sessions: {er}");
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.0.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn is_active(record: &Record) -> bool {
    record.expiry_date > OffsetDateTime::now_utc()
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        let mut records = self.0.lock().await;
        // Session ID collision
        while records.contains_key(&record.id) {
            record.id = Id::default();
        }
        records.insert(record.id, record.clone());
        Ok(())
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.0.lock().await.insert(record.id, record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        Ok(self
            .0
            .lock()
            .await
            .get(session_id)
            .filter(|record| is_active(record))
            .cloned())
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        self.0.lock().await.remove(session_id);
        Ok(())
    }
}

#[async_trait]
impl ExpiredDeletion for MemorySessionStore {
    async fn delete_expired(&self) -> session_store::Result<()> {
        let mut records = self.0.lock().await;
        let before = records.len();
        records.retain(|_, record| is_active(record));
        debug!(deleted = before - records.len(), "expired sessions removed");
        Ok(())
    }
}
