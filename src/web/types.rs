//! Most of the structs in `web` module and their implementations live here.
//! Includes structs that need to be validated, their parsing implementations and tests for those

use derive_more::Deref;
use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::{model::PrayerRecord, utils, web::auth::SessionUser};

// ###################################
// ->   STRUCTS
// ###################################
/// Body of every JSON response from the API: `{"message": "..."}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Deserializable Prayer
/// A prayer request as received from the form, any field can be missing.
#[derive(Debug, Default, Deserialize)]
pub struct DeserPrayer {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub prayer: Option<String>,
}

/// Validated Prayer
/// All three user supplied fields are present and non-empty.
#[derive(Debug, Clone)]
pub struct ValidPrayer {
    pub name: RequiredField,
    pub email: RequiredField,
    pub prayer: RequiredField,
}

impl TryFrom<DeserPrayer> for ValidPrayer {
    type Error = DataParsingError;

    fn try_from(deser: DeserPrayer) -> Result<Self, Self::Error> {
        Ok(ValidPrayer {
            name: RequiredField::parse("name", deser.name)?,
            email: RequiredField::parse("email", deser.email)?,
            prayer: RequiredField::parse("prayer", deser.prayer)?,
        })
    }
}

impl ValidPrayer {
    /// Stamps the prayer with the current time and the submitter's canonical identifier.
    pub fn into_record(self, user: &SessionUser) -> PrayerRecord {
        PrayerRecord {
            name: self.name.0,
            email: self.email.0,
            prayer: self.prayer.0,
            date: DateTime::now(),
            user: user.canonical_id().to_string(),
        }
    }
}

/// A user supplied field that must not be missing or empty. No other checks are made.
#[derive(Debug, Clone, Deref)]
pub struct RequiredField(String);

impl RequiredField {
    pub fn parse(field: &'static str, value: Option<String>) -> Result<Self, DataParsingError> {
        match value {
            Some(value) if !value.is_empty() => Ok(RequiredField(value)),
            _ => Err(DataParsingError::FieldMissing(field)),
        }
    }
}

/// A random 43 character-long Base64-URL encoded CSRF token bound to a sign-in attempt.
#[derive(Debug, Clone, PartialEq, Eq, Deref, Serialize, Deserialize)]
pub struct CsrfState(String);

impl CsrfState {
    pub fn generate() -> Self {
        Self(utils::random_b64u_token::<32>())
    }
}

/// Query of `GET /api/auth/signin`
#[derive(Debug, Default, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

impl SignInQuery {
    /// Only same-site absolute paths are honoured, everything else falls back to `/`.
    /// Browsers drop tabs and newlines from a `Location`, so `/\t/host` would become `//host`.
    /// Restricting to printable ASCII also keeps the value a valid header.
    pub fn safe_callback_url(&self) -> String {
        match self.callback_url.as_deref() {
            Some(url)
                if url.starts_with('/')
                    && !url.starts_with("//")
                    && !url.contains('\\')
                    && url.bytes().all(|b| b.is_ascii_graphic()) =>
            {
                url.to_string()
            }
            _ => "/".to_string(),
        }
    }
}

/// Query the provider sends back to `GET /api/auth/callback/{provider}`
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("required field missing or empty: {0}")]
    FieldMissing(&'static str),
}
