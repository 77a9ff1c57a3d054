//! Contains all the routes that this application can handle.

mod auth;
mod home;
mod prayer;

use crate::AppState;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};

async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// All the routes of the server
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(home::home))
        .route("/about", get(home::about))
        .with_state(app_state.clone())
        .nest("/api", api_routes(app_state))
        .route("/health-check", get(health_check))
}

/// API - Routes nested under "/api" path
fn api_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/prayer",
            post(prayer::prayer_submit).fallback(prayer::method_not_allowed),
        )
        .with_state(app_state.clone())
        .nest("/auth", auth_routes(app_state))
}

/// AUTH - Routes nested under "/auth" path
fn auth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/signin", get(auth::signin))
        .route("/signin/{provider}", get(auth::signin_with))
        .route("/callback/{provider}", get(auth::callback))
        .route("/signout", post(auth::signout).get(auth::signout))
        .route("/session", get(auth::session))
        .with_state(app_state)
}
