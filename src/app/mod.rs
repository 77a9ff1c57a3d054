pub mod serve;

// re-export
pub use serve::serve;

use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use secrecy::SecretSlice;
use tokio::net::TcpListener;
use tower_sessions_redis_store::{fred::prelude::Pool, RedisStore};
use tracing::info;

use crate::{
    config::{AppConfig, ConfigError, SessionBackendKind, StoreKind},
    database::DbManager,
    model::{MemoryStore, PrayerStore},
    oauth_client::IdentityProviders,
    redis_manager::RedisManager,
    session_store::MemorySessionStore,
    templ_manager::TemplateManager,
    Result,
};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub sessions: SessionSettings,
    pub listener: TcpListener,
}

/// Where sessions live.
pub enum SessionBackend {
    Memory(MemorySessionStore),
    Redis(RedisStore<Pool>),
}

/// Everything the session layer is built from.
pub struct SessionSettings {
    pub backend: SessionBackend,
    pub cookie_secret: SecretSlice<u8>,
    pub secure: bool,
    pub expiry_secs: i64,
}

impl App {
    pub fn new(app_state: AppState, sessions: SessionSettings, listener: TcpListener) -> Self {
        App {
            app_state,
            sessions,
            listener,
        }
    }

    /// Builds the App with the prayer store named in the configuration.
    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let prayer_store: Arc<dyn PrayerStore> = match config.db_config.store {
            StoreKind::Mongo => Arc::new(DbManager::init(&config.db_config).await?),
            StoreKind::Memory => {
                info!("{:<20} - Using the in-memory prayer store", "init_store");
                Arc::new(MemoryStore::new())
            }
        };

        Self::build_with_store(config, prayer_store).await
    }

    pub async fn build_with_store(
        config: AppConfig,
        prayer_store: Arc<dyn PrayerStore>,
    ) -> Result<Self> {
        let session_config = &config.session_config;
        let cookie_secret = session_config.cookie_secret()?;
        let backend = match session_config.backend {
            SessionBackendKind::Memory => SessionBackend::Memory(MemorySessionStore::new()),
            SessionBackendKind::Redis => {
                let redis_uri = session_config
                    .redis_uri
                    .as_ref()
                    .ok_or(ConfigError::MissingRedisUri)?;
                let redis_mgr = RedisManager::init(redis_uri).await?;
                SessionBackend::Redis(redis_mgr.session_store())
            }
        };
        let sessions = SessionSettings {
            backend,
            cookie_secret,
            secure: session_config.secure,
            expiry_secs: session_config.expiry_secs,
        };

        let tm = TemplateManager::init();
        let identity =
            IdentityProviders::from_config(&config.auth_config, &config.net_config.base_url)?;

        let app_state = AppState::new(prayer_store, tm, identity);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        Ok(App::new(app_state, sessions, listener))
    }
}

pub struct InternalState {
    pub prayer_store: Arc<dyn PrayerStore>,
    pub templ_mgr: TemplateManager,
    pub identity: IdentityProviders,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(
        prayer_store: Arc<dyn PrayerStore>,
        templ_mgr: TemplateManager,
        identity: IdentityProviders,
    ) -> Self {
        AppState(Arc::new(InternalState {
            prayer_store,
            templ_mgr,
            identity,
        }))
    }
}
