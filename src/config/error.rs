pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to build the 'Environment' from the provided string.")]
    StringToEnvironmentFail,
    #[error("session secret is not valid base64-url: {0}")]
    SessionSecretEncoding(String),
    #[error("session secret must be at least 64 bytes long, got: {0}")]
    SessionSecretTooShort(usize),
    #[error("the 'redis' session backend requires 'session_config.redis_uri'")]
    MissingRedisUri,

    #[error("figment error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        ConfigError::Figment(Box::new(value))
    }
}
