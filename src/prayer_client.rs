//! A typed HTTP client for the prayer API. Keeps cookies, so a client that went through the
//! sign-in redirects can submit as that user.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::web::{
    auth::SessionView,
    form::{PrayerFields, PrayerSubmitter},
    types::MessageBody,
};

#[derive(Debug, Clone)]
pub struct PrayerClient {
    http_client: Client,
    url: Url,
}

impl PrayerClient {
    pub fn new<S: AsRef<str>>(base_url: S, timeout: std::time::Duration) -> Result<Self> {
        let http_client = Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Self::with_http_client(base_url, http_client)
    }

    /// Reuses an existing client, e.g. one whose cookie store already holds a session.
    pub fn with_http_client<S: AsRef<str>>(base_url: S, http_client: Client) -> Result<Self> {
        let url =
            reqwest::Url::parse(base_url.as_ref()).map_err(|e| Error::UrlParsing(e.to_string()))?;
        Ok(PrayerClient { http_client, url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.url
            .join(path)
            .map_err(|e| Error::UrlParsing(e.to_string()))
    }

    /// Posts the fields and returns the status together with the server's message.
    pub async fn submit_prayer(&self, fields: &PrayerFields) -> Result<(StatusCode, MessageBody)> {
        let resp = self
            .http_client
            .post(self.endpoint("api/prayer")?)
            .json(fields)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.json::<MessageBody>().await?;

        Ok((status, body))
    }

    /// The current session, `None` when signed out.
    pub async fn session(&self) -> Result<Option<SessionView>> {
        let session = self
            .http_client
            .get(self.endpoint("api/auth/session")?)
            .send()
            .await?
            .error_for_status()?
            .json::<Option<SessionView>>()
            .await?;

        Ok(session)
    }
}

#[async_trait]
impl PrayerSubmitter for PrayerClient {
    type Error = Error;

    async fn submit(&self, fields: &PrayerFields) -> Result<StatusCode> {
        let resp = self
            .http_client
            .post(self.endpoint("api/prayer")?)
            .json(fields)
            .send()
            .await?;

        Ok(resp.status())
    }
}

// ###################################
// ->   ERROR & RESULT
// ###################################
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("url parsing error: {0}")]
    UrlParsing(String),
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
