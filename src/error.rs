use crate::{app, config, database, model, oauth_client, web};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("web error: {0}")]
    Web(#[from] web::Error),
    #[error("database error: {0}")]
    Database(#[from] database::Error),
    #[error("model error: {0}")]
    Model(#[from] model::Error),
    #[error("oauth client error: {0}")]
    OAuthClient(#[from] oauth_client::Error),
    #[error("redis error: {0}")]
    Redis(#[from] tower_sessions_redis_store::fred::error::Error),
    #[error("serving error: {0}")]
    Serve(#[from] app::serve::ServeError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
