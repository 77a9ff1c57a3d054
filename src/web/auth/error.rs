use axum::http::StatusCode;

use crate::{oauth_client, web::error::ClientError};

pub type Result<T> = core::result::Result<T, AuthError>;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("no signed-in user in the session")]
    NotSignedIn,
    #[error("unknown identity provider: {0}")]
    UnknownProvider(String),
    #[error("callback without a sign-in in progress")]
    NoPendingSignIn,
    #[error("callback state does not match the sign-in state")]
    StateMismatch,
    #[error("callback is missing the authorization code")]
    MissingCode,
    #[error("provider denied the sign-in: {0}")]
    ProviderDenied(String),
    #[error("provider profile has no email address")]
    MissingEmail,

    #[error("oauth client error: {0}")]
    OAuthClient(#[from] oauth_client::Error),
    #[error("tower_sessions error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

impl AuthError {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use AuthError::*;

        match self {
            NotSignedIn | UnknownProvider(_) | NoPendingSignIn | StateMismatch | MissingCode
            | ProviderDenied(_) | MissingEmail => {
                (StatusCode::UNAUTHORIZED, ClientError::Unauthorized)
            }
            OAuthClient(_) | Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, ClientError::ServiceError)
            }
        }
    }
}
