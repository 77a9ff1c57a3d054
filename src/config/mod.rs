//! Tries to create an `AppConfig` from config files and the environment.
//! Files live in `config/`: `base.toml` is always loaded, `local.toml` or `production.toml`
//! is layered on top based on `APP_ENVIRONMENT`.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod types;

use std::sync::OnceLock;
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use types::{
    AppConfig, AuthConfig, DbConfig, Environment, NetConfig, ProviderConfig, SessionBackendKind,
    SessionConfig, StoreKind,
};

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<20} - Initializing the configuration",
            "get_or_init_config"
        );
        let base_path = std::env::current_dir().expect("Failed to determine the current DIR.");
        let config_dir = base_path.join("config");

        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .expect("Failed to parse APP_ENVIRONMENT.");

        AppConfig::load(&config_dir, environment)
            .unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"))
    })
}
