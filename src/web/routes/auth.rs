use axum::{
    extract::{Path, Query, State},
    response::Redirect,
    Json,
};
use tower_sessions::Session;
use tracing::{debug, info};

use crate::{
    web::{
        auth::{AuthError, PendingSignIn, SessionUser, SessionView, UserSession},
        types::{CallbackQuery, SignInQuery},
        WebResult,
    },
    AppState,
};

/// Starts a sign-in with the default provider.
pub async fn signin(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<SignInQuery>,
) -> WebResult<Redirect> {
    let provider = app_state.identity.default_provider().id().to_string();
    start_sign_in(&app_state, &session, &provider, &query).await
}

/// Starts a sign-in with the named provider.
pub async fn signin_with(
    State(app_state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
    Query(query): Query<SignInQuery>,
) -> WebResult<Redirect> {
    start_sign_in(&app_state, &session, &provider, &query).await
}

#[tracing::instrument(name = "start_sign_in", skip(app_state, session, query))]
async fn start_sign_in(
    app_state: &AppState,
    session: &Session,
    provider: &str,
    query: &SignInQuery,
) -> WebResult<Redirect> {
    let client = app_state
        .identity
        .get(provider)
        .ok_or_else(|| AuthError::UnknownProvider(provider.to_string()))?;

    let pending = PendingSignIn::new(client.id(), query.safe_callback_url());
    pending.store(session).await?;

    Ok(Redirect::to(client.authorize_url(&pending.state).as_str()))
}

/// The provider redirects the user agent here after the user consented (or refused).
#[tracing::instrument(name = "auth_callback", skip(app_state, session, query))]
pub async fn callback(
    State(app_state): State<AppState>,
    session: Session,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> WebResult<Redirect> {
    let pending = PendingSignIn::take(&session).await?;

    if let Some(error) = query.error {
        return Err(AuthError::ProviderDenied(error).into());
    }
    pending.verify(&provider, query.state.as_deref())?;
    let code = query.code.ok_or(AuthError::MissingCode)?;

    let client = app_state
        .identity
        .get(&provider)
        .ok_or_else(|| AuthError::UnknownProvider(provider.clone()))?;
    let profile = client.authenticate(&code).await.map_err(AuthError::from)?;
    let user = SessionUser::try_from(profile)?;

    let user_session = UserSession::sign_in(session, user).await?;
    info!(user = %user_session.email(), "signed in");

    Ok(Redirect::to(&pending.callback_url))
}

/// Forgets everything stored in the session.
pub async fn signout(session: Session) -> WebResult<Redirect> {
    session.flush().await?;
    debug!("signed out");

    Ok(Redirect::to("/"))
}

/// The signed-in user, or `null`.
pub async fn session(session: Session) -> WebResult<Json<Option<SessionView>>> {
    let user_session = UserSession::load(session).await?;

    Ok(Json(user_session.as_ref().map(UserSession::view)))
}
