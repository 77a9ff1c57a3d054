use std::time::Duration;

use axum::{
    body::Body,
    http::{HeaderName, Request, Response},
    middleware, Router,
};
use secrecy::ExposeSecret;
use tower::ServiceBuilder;
use tower_http::{
    classify::{ServerErrorsAsFailures, SharedClassifier},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{MakeSpan, OnRequest, OnResponse, TraceLayer},
};
use tower_sessions::{
    cookie::{time, Key, SameSite},
    Expiry, SessionManagerLayer,
};
use tracing::{info, Span};

use crate::{
    app::{App, SessionBackend, SessionSettings},
    web::{midware, routes::routes, REQUEST_ID_HEADER},
};

const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// The core async function serving this application until a shutdown signal arrives.
///
/// Builds the router from `App`, wraps it in the session, request-id and trace layers and
/// shuts the prayer store down once the server stopped.
pub async fn serve(app: App) -> Result<(), ServeError> {
    let App {
        app_state,
        sessions,
        listener,
    } = app;
    let x_request_id: HeaderName = HeaderName::from_static(REQUEST_ID_HEADER);

    let trace_layer = build_trace_layer();

    // The in-memory store keeps records until they are swept.
    let sweeper = match &sessions.backend {
        SessionBackend::Memory(store) => Some(tokio::spawn(
            store.clone().sweep_expired(SESSION_SWEEP_PERIOD),
        )),
        SessionBackend::Redis(_) => None,
    };

    let router = with_sessions(routes(app_state.clone()), sessions).layer(
        ServiceBuilder::new()
            // Set UUID per request
            .layer(SetRequestIdLayer::new(
                x_request_id.clone(),
                MakeRequestUuid,
            ))
            // Propagate UUID to response, it has to wrap the mapper since error responses
            // are rebuilt there.
            .layer(PropagateRequestIdLayer::new(x_request_id))
            .layer(trace_layer)
            .layer(middleware::map_response(midware::response_mapper)),
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("{:<20} - Server stopped, cleaning up", "serve");
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    app_state.prayer_store.shutdown().await;

    Ok(())
}

/// Wraps the router in a signed-cookie session layer for the configured backend.
fn with_sessions(router: Router, settings: SessionSettings) -> Router {
    let SessionSettings {
        backend,
        cookie_secret,
        secure,
        expiry_secs,
    } = settings;
    // Length is checked when the secret is decoded from config.
    let key = Key::from(cookie_secret.expose_secret());
    let expiry = Expiry::OnInactivity(time::Duration::seconds(expiry_secs));

    // Lax so the cookie survives the top-level redirect back from the provider.
    match backend {
        SessionBackend::Memory(store) => router.layer(
            SessionManagerLayer::new(store)
                .with_secure(secure)
                .with_same_site(SameSite::Lax)
                .with_expiry(expiry)
                .with_signed(key),
        ),
        SessionBackend::Redis(store) => router.layer(
            SessionManagerLayer::new(store)
                .with_secure(secure)
                .with_same_site(SameSite::Lax)
                .with_expiry(expiry)
                .with_signed(key),
        ),
    }
}

/// Resolves on SIGINT (Ctrl-C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(er) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install the Ctrl-C handler: {er}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(er) => {
                tracing::error!("failed to install the SIGTERM handler: {er}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("{:<20} - Received SIGINT, shutting down", "shutdown"),
        () = terminate => info!("{:<20} - Received SIGTERM, shutting down", "shutdown"),
    }
}

/// A helper function that sets up the `tower_http::TraceLayer` - tracing configuration.
fn build_trace_layer() -> TraceLayer<
    SharedClassifier<ServerErrorsAsFailures>,
    impl MakeSpan<Body> + Clone,
    impl OnRequest<Body> + Clone,
    impl OnResponse<Body> + Clone,
> {
    TraceLayer::new_for_http()
        .make_span_with(|req: &Request<Body>| {
            let uuid = req
                .headers()
                .get(REQUEST_ID_HEADER)
                .map(|uuid| uuid.to_str().unwrap_or("").to_string());

            tracing::error_span!(
                "serve",
                id = uuid,
                method = req.method().to_string(),
                path = req.uri().path()
            )
        })
        .on_request(|req: &Request<Body>, _s: &Span| tracing::info!("START @ {}", req.uri()))
        .on_response(|res: &Response<Body>, latency: Duration, _s: &Span| {
            let st_code = res.status().as_u16();

            if (500..=599).contains(&st_code) {
                tracing::error!("END in: {:?} - STATUS: {st_code}", latency)
            } else {
                tracing::info!("END in: {:?} - STATUS: {st_code}", latency)
            }
        })
}
