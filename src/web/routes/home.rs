use axum::{extract::State, response::Html};
use tower_sessions::Session;

use crate::{
    web::{auth::UserSession, form::FormMessages, WebResult},
    AppState,
};

#[tracing::instrument(name = "home", skip_all)]
pub async fn home(State(app_state): State<AppState>, session: Session) -> WebResult<Html<String>> {
    let user_session = UserSession::load(session).await?;

    let mut ctx = tera::Context::new();
    ctx.insert("user", &user_session.as_ref().map(UserSession::user));
    ctx.insert("provider_name", app_state.identity.default_provider().name());
    ctx.insert("messages", &FormMessages::default());

    let body = app_state
        .templ_mgr
        .render_html_to_string(&ctx, "index.html")?;

    Ok(Html(body))
}

pub async fn about(State(app_state): State<AppState>) -> WebResult<Html<String>> {
    let body = app_state
        .templ_mgr
        .render_html_to_string(&tera::Context::new(), "about.html")?;

    Ok(Html(body))
}
