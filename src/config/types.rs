//! The configuration structs used to build the AppConfig, and their impls.
use std::{path::Path, time::Duration};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::{ExposeSecret, SecretSlice, SecretString};
use serde::Deserialize;
use strum_macros::AsRefStr;

use crate::config::{ConfigError, ConfigResult};
use crate::utils;

/// Conventional environment variables and the config keys they override.
const ENV_OVERRIDES: [(&str, &str); 3] = [
    ("MONGODB_URI", "db_config.uri"),
    ("SESSION_SECRET", "session_config.secret_b64u"),
    ("REDIS_URI", "session_config.redis_uri"),
];

// ###################################
// ->   STRUCTS
// ###################################
#[derive(AsRefStr, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub net_config: NetConfig,
    pub db_config: DbConfig,
    pub session_config: SessionConfig,
    pub auth_config: AuthConfig,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NetConfig {
    pub host: [u8; 4],
    pub app_port: u16,
    pub base_url: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DbConfig {
    pub uri: SecretString,
    pub db_name: String,
    pub collection: String,
    pub connect_timeout_millis: u64,
    #[serde(default)]
    pub store: StoreKind,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Mongo,
    Memory,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackendKind,
    pub redis_uri: Option<SecretString>,
    pub secret_b64u: SecretString,
    pub secure: bool,
    pub expiry_secs: i64,
}

#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    #[default]
    Memory,
    Redis,
}

#[derive(Deserialize, Clone, Debug)]
pub struct AuthConfig {
    pub timeout_millis: u64,
    pub providers: Vec<ProviderConfig>,
}

/// A single OAuth 2.0 identity provider.
#[derive(Deserialize, Clone, Debug)]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub auth_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub scopes: Vec<String>,
}

// ###################################
// ->   IMPLs
// ###################################
impl AppConfig {
    /// Layers `base.toml`, the environment specific file and `APP_` prefixed environment
    /// variables (nested with `__`), then applies the conventional overrides.
    pub fn load(config_dir: &Path, environment: Environment) -> ConfigResult<Self> {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let mut figment = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").split("__"));
        for (var, key) in ENV_OVERRIDES {
            figment = figment.merge(Env::raw().only(&[var]).map(move |_| key.into()));
        }

        let mut config: AppConfig = figment.extract()?;
        config.apply_provider_overrides(|var| std::env::var(var).ok());

        Ok(config)
    }

    /// Provider credentials can't be addressed through a figment key since they live in an
    /// array, so `{ID}_CLIENT_ID` and `{ID}_CLIENT_SECRET` are applied here instead.
    pub fn apply_provider_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for provider in self.auth_config.providers.iter_mut() {
            let prefix = provider.id.to_ascii_uppercase();
            if let Some(client_id) = lookup(&format!("{prefix}_CLIENT_ID")) {
                provider.client_id = client_id;
            }
            if let Some(client_secret) = lookup(&format!("{prefix}_CLIENT_SECRET")) {
                provider.client_secret = SecretString::from(client_secret);
            }
        }
    }
}

impl DbConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_millis)
    }
}

impl SessionConfig {
    /// Decodes the cookie signing secret. Signed cookies need at least 64 bytes of key material.
    pub fn cookie_secret(&self) -> ConfigResult<SecretSlice<u8>> {
        let bytes = utils::b64u_decode(self.secret_b64u.expose_secret())
            .map_err(|er| ConfigError::SessionSecretEncoding(er.to_string()))?;
        if bytes.len() < 64 {
            return Err(ConfigError::SessionSecretTooShort(bytes.len()));
        }
        Ok(SecretSlice::from(bytes))
    }
}

impl AuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_millis)
    }
}

// ###################################
// ->   TRY FROMs
// ###################################
impl TryFrom<String> for Environment {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            _ => Err(Self::Error::StringToEnvironmentFail),
        }
    }
}
