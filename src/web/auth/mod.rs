//! Session backed sign-in state.
//! `UserSession` can be extracted in a handler and rejects requests without a signed-in user.
//! `PendingSignIn` holds the CSRF state between the sign-in redirect and the provider callback.

mod error;

pub use error::{AuthError, Result};

use anyhow::anyhow;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    oauth_client::ProviderProfile,
    web::{self, types::CsrfState},
};

/// The signed-in user as stored in the session.
/// `id` is the provider's stable subject, `email` is the canonical identifier on stored records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
}

impl SessionUser {
    pub fn canonical_id(&self) -> &str {
        &self.email
    }
}

impl TryFrom<ProviderProfile> for SessionUser {
    type Error = AuthError;

    fn try_from(profile: ProviderProfile) -> Result<Self> {
        let email = profile
            .email
            .filter(|email| !email.is_empty())
            .ok_or(AuthError::MissingEmail)?;

        Ok(SessionUser {
            id: profile.sub,
            email,
            name: profile.name,
            image: profile.image,
        })
    }
}

/// What `GET /api/auth/session` returns for a signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub user: SessionUser,
    pub expires: String,
}

/// A session that contains a signed-in user.
pub struct UserSession {
    session: Session,
    user: SessionUser,
}

impl UserSession {
    const USER_KEY: &'static str = "user";

    // -> getters
    pub fn user(&self) -> &SessionUser {
        &self.user
    }

    pub fn email(&self) -> &str {
        &self.user.email
    }

    pub fn view(&self) -> SessionView {
        let expiry = self.session.expiry_date().unix_timestamp();
        let expires = DateTime::<Utc>::from_timestamp(expiry, 0).unwrap_or_else(Utc::now);
        SessionView {
            user: self.user.clone(),
            expires: expires.to_rfc3339(),
        }
    }

    /// Loads the signed-in user from the session, `None` if nobody is signed in.
    pub async fn load(session: Session) -> Result<Option<Self>> {
        let user = session.get::<SessionUser>(Self::USER_KEY).await?;
        Ok(user.map(|user| Self { session, user }))
    }

    /// Stores the user in the session under a fresh session ID.
    pub async fn sign_in(session: Session, user: SessionUser) -> Result<Self> {
        // Mitigate session fixation attacks
        // more: https://owasp.org/www-community/attacks/Session_fixation
        session.cycle_id().await?;
        session.insert(Self::USER_KEY, &user).await?;
        Ok(Self { session, user })
    }
}

impl<S> FromRequestParts<S> for UserSession
where
    S: Send + Sync,
{
    type Rejection = web::Error;

    #[instrument(skip_all, name = "UserSession from_request_parts")]
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> core::result::Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Err(anyhow!("unable to extract the session from request parts").into());
        };

        UserSession::load(session)
            .await?
            .ok_or_else(|| AuthError::NotSignedIn.into())
    }
}

/// A sign-in that was started but not yet completed by the provider callback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSignIn {
    pub provider: String,
    pub state: CsrfState,
    pub callback_url: String,
}

impl PendingSignIn {
    const PENDING_KEY: &'static str = "pending_sign_in";

    pub fn new(provider: impl Into<String>, callback_url: String) -> Self {
        PendingSignIn {
            provider: provider.into(),
            state: CsrfState::generate(),
            callback_url,
        }
    }

    pub async fn store(&self, session: &Session) -> Result<()> {
        session.insert(Self::PENDING_KEY, self).await?;
        Ok(())
    }

    /// Removes the pending sign-in from the session. Every state is usable only once.
    pub async fn take(session: &Session) -> Result<Self> {
        session
            .remove::<Self>(Self::PENDING_KEY)
            .await?
            .ok_or(AuthError::NoPendingSignIn)
    }

    pub fn verify(&self, provider: &str, state: Option<&str>) -> Result<()> {
        if self.provider != provider {
            return Err(AuthError::UnknownProvider(provider.to_string()));
        }
        match state {
            Some(state) if state == self.state.as_str() => Ok(()),
            _ => Err(AuthError::StateMismatch),
        }
    }
}
