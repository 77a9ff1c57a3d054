use async_trait::async_trait;
use mongodb::{options::ClientOptions, Client, Collection};
use secrecy::ExposeSecret;
use tracing::info;

use crate::{
    config::DbConfig,
    model::{self, PrayerRecord, PrayerStore},
};

/// Holds the pooled MongoDB client for the whole process.
/// Connections are established lazily by the driver on first use.
#[derive(Clone, Debug)]
pub struct DbManager {
    client: Client,
    prayers: Collection<PrayerRecord>,
}

impl DbManager {
    pub async fn init(db_config: &DbConfig) -> Result<Self> {
        info!("{:<20} - Initializing the DB client", "init_db");
        let mut options = ClientOptions::parse(db_config.uri.expose_secret()).await?;
        options.app_name = Some("spiritual-cookie".to_string());
        options.connect_timeout = Some(db_config.connect_timeout());
        options.server_selection_timeout = Some(db_config.connect_timeout());

        let client = Client::with_options(options)?;
        let prayers = client
            .database(&db_config.db_name)
            .collection::<PrayerRecord>(&db_config.collection);

        Ok(Self { client, prayers })
    }
}

#[async_trait]
impl PrayerStore for DbManager {
    #[tracing::instrument(
        name = "insert_prayer_mongo",
        skip_all,
        fields(collection = %self.prayers.name())
    )]
    async fn insert(&self, record: &PrayerRecord) -> model::Result<()> {
        let res = self.prayers.insert_one(record).await?;
        tracing::debug!(inserted_id = %res.inserted_id);
        Ok(())
    }

    async fn shutdown(&self) {
        info!("{:<20} - Shutting down the DB client", "shutdown_db");
        self.client.clone().shutdown().await;
    }
}

// ###################################
// ->   ERROR
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("mongodb error: {0}")]
    Mongo(#[from] mongodb::error::Error),
}
