//! Spiritual Cookie: a small web service that lets signed-in users submit prayer requests.

pub mod app;
pub mod config;
pub mod database;
mod error;
pub mod model;
pub mod oauth_client;
pub mod prayer_client;
pub mod redis_manager;
pub mod session_store;
pub mod templ_manager;
pub mod utils;
pub mod web;

// re-export
pub use app::{serve, App, AppState};
pub use error::{Error, Result};

use tracing_subscriber::{
    fmt::{format::FmtSpan, MakeWriter},
    util::SubscriberInitExt,
    EnvFilter,
};

/// Human readable, compact output. The filter falls back to `debug` when `RUST_LOG` is unset.
pub fn init_dbg_tracing() {
    tracing_subscriber::fmt()
        .without_time()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .compact()
        .init();
}

/// One JSON object per event on stdout, for log collectors.
pub fn init_production_tracing() {
    production_subscriber(std::io::stdout).init();
}

fn production_subscriber<W>(make_writer: W) -> impl tracing::Subscriber + Send + Sync + 'static
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(make_writer)
        .finish()
}
