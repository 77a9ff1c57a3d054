use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tower_sessions_redis_store::{
    fred::{
        self,
        prelude::{ClientLike, Config, Pool},
        types::Builder,
    },
    RedisStore,
};
use tracing::info;

type Result<T> = core::result::Result<T, fred::error::Error>;

/// Contains the redis connection pool backing production sessions. Cheaply cloneable.
#[derive(Clone, Debug)]
pub struct RedisManager {
    pool: Pool,
}

impl RedisManager {
    pub async fn init(redis_uri: &SecretString) -> Result<Self> {
        info!("{:<20} - Initializing the REDIS client", "init_redis_cl");
        let conf = Config::from_url(redis_uri.expose_secret())?;

        let pool = Builder::from_config(conf)
            .with_connection_config(|config| config.connection_timeout = Duration::from_secs(10))
            .build_pool(5)?;

        pool.init().await?;
        info!("connected to REDIS");

        Ok(RedisManager { pool })
    }

    /// A session store that shares this manager's pool.
    pub fn session_store(&self) -> RedisStore<Pool> {
        RedisStore::new(self.pool.clone())
    }
}
