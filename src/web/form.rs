//! The prayer form's client state.
//! The page script in `templates/html/index.html` follows the same rules, it receives the
//! messages below through the template context so both always agree.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

pub const MSG_SIGN_IN: &str = "Please sign in to submit a prayer request.";
pub const MSG_SUBMITTING: &str = "Submitting your prayer request...";
pub const MSG_SUCCESS: &str = "Thank you! Your prayer request has been submitted.";
pub const MSG_FAILURE: &str = "Something went wrong. Please try again.";
pub const MSG_NETWORK_ERROR: &str = "Error submitting prayer request. Please try later.";

/// All status messages the form can show, handed to the page template.
#[derive(Debug, Clone, Serialize)]
pub struct FormMessages {
    pub sign_in: &'static str,
    pub submitting: &'static str,
    pub success: &'static str,
    pub failure: &'static str,
    pub network_error: &'static str,
}

impl Default for FormMessages {
    fn default() -> Self {
        FormMessages {
            sign_in: MSG_SIGN_IN,
            submitting: MSG_SUBMITTING,
            success: MSG_SUCCESS,
            failure: MSG_FAILURE,
            network_error: MSG_NETWORK_ERROR,
        }
    }
}

/// The three text fields, serialized as the JSON body of `POST /api/prayer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PrayerFields {
    pub name: String,
    pub email: String,
    pub prayer: String,
}

/// Sends the form to the submission endpoint.
/// `Err` means the call itself failed, any HTTP answer is `Ok(status)`.
#[async_trait]
pub trait PrayerSubmitter: Send + Sync {
    type Error: std::error::Error + Send;

    async fn submit(&self, fields: &PrayerFields) -> Result<StatusCode, Self::Error>;
}

#[derive(Debug, Default)]
pub struct FormPage {
    fields: PrayerFields,
    message: String,
}

impl FormPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &PrayerFields {
        &self.fields
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Binds an input by its `name` attribute. Unknown names are ignored.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match name {
            "name" => self.fields.name = value,
            "email" => self.fields.email = value,
            "prayer" => self.fields.prayer = value,
            _ => {}
        }
    }

    /// First half of a submission. Signed-out users get a prompt and `false`, nothing may be
    /// sent. Otherwise the in-progress message is shown and the caller sends `fields()`.
    pub fn begin_submit(&mut self, signed_in: bool) -> bool {
        if !signed_in {
            self.message = MSG_SIGN_IN.to_string();
            return false;
        }

        self.message = MSG_SUBMITTING.to_string();
        true
    }

    /// Second half of a submission, applies the endpoint's answer.
    pub fn finish<E>(&mut self, answer: Result<StatusCode, E>) -> &str
    where
        E: std::fmt::Display,
    {
        self.message = match answer {
            Ok(status) if status.is_success() => {
                self.fields = PrayerFields::default();
                MSG_SUCCESS.to_string()
            }
            Ok(status) => {
                tracing::debug!(%status, "prayer submission refused");
                MSG_FAILURE.to_string()
            }
            Err(er) => {
                tracing::debug!(error = %er, "prayer submission failed");
                MSG_NETWORK_ERROR.to_string()
            }
        };

        &self.message
    }

    /// Runs one submission through `submitter`.
    pub async fn submit<S>(&mut self, signed_in: bool, submitter: &S) -> &str
    where
        S: PrayerSubmitter,
    {
        if !self.begin_submit(signed_in) {
            return &self.message;
        }

        let answer = submitter.submit(&self.fields).await;
        self.finish(answer)
    }
}
