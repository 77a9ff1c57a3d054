use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use strum_macros::AsRefStr;

use super::{auth::AuthError, types::DataParsingError};
use crate::model;

pub type WebResult<T> = core::result::Result<T, Error>;

#[derive(Debug, AsRefStr, thiserror::Error)]
pub enum Error {
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("request body rejected: {0}")]
    JsonRejected(String),

    #[error("data parsing error: {0}")]
    DataParsing(#[from] DataParsingError),
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("prayer store error: {0}")]
    Model(#[from] model::Error),

    #[error("tower_sessions error: {0}")]
    Session(#[from] tower_sessions::session::Error),
    #[error("templating error: {0}")]
    Tera(#[from] tera::Error),
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code_and_client_error(&self) -> (StatusCode, ClientError) {
        use ClientError::*;

        match self {
            Error::MethodNotAllowed => (StatusCode::METHOD_NOT_ALLOWED, MethodNotAllowed),
            Error::JsonRejected(_) | Error::DataParsing(_) => {
                (StatusCode::BAD_REQUEST, InvalidInput)
            }
            Error::Auth(auth_er) => auth_er.status_code_and_client_error(),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, ServiceError),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        tracing::debug!("{:<12} - into_response(Error: {self:?})", "INTO_RESP");

        // Construct a response
        let mut res = StatusCode::INTERNAL_SERVER_ERROR.into_response();

        // Insert the Error into response so that it can be retrieved later.
        res.extensions_mut().insert(Arc::new(self));

        res
    }
}

/// The only error messages a client ever sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, derive_more::Display)]
pub enum ClientError {
    #[display("All fields are required")]
    InvalidInput,
    #[display("Unauthorized")]
    Unauthorized,
    #[display("Method Not Allowed")]
    MethodNotAllowed,
    #[display("Internal Server Error")]
    ServiceError,
}
