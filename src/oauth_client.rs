//! OAuth 2.0 authorization-code client for the configured identity providers.
//! The provider owns the flow. We only build the authorization redirect, exchange the code
//! and read the user profile.

use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::config::{AuthConfig, ProviderConfig};

#[derive(Debug)]
pub struct OAuthClient {
    http_client: Client,
    id: String,
    name: String,
    client_id: String,
    client_secret: SecretString,
    auth_url: Url,
    token_url: Url,
    userinfo_url: Url,
    redirect_url: Url,
    scopes: String,
}

/// Token endpoint response. Only the access token is used.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: SecretString,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Profile returned by the userinfo endpoint.
/// Google's OpenID endpoint names the subject `sub`, the legacy v2 endpoint `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderProfile {
    #[serde(alias = "id")]
    pub sub: String,
    pub email: Option<String>,
    pub name: Option<String>,
    #[serde(alias = "picture")]
    pub image: Option<String>,
}

impl OAuthClient {
    pub fn new(provider: &ProviderConfig, base_url: &str, http_client: Client) -> Result<Self> {
        let parse = |url: &str| Url::parse(url).map_err(|e| Error::UrlParsing(e.to_string()));

        let redirect_url = parse(base_url)?
            .join(&format!("api/auth/callback/{}", provider.id))
            .map_err(|e| Error::UrlParsing(e.to_string()))?;

        Ok(OAuthClient {
            http_client,
            id: provider.id.clone(),
            name: provider.name.clone(),
            client_id: provider.client_id.clone(),
            client_secret: provider.client_secret.clone(),
            auth_url: parse(&provider.auth_url)?,
            token_url: parse(&provider.token_url)?,
            userinfo_url: parse(&provider.userinfo_url)?,
            redirect_url,
            scopes: provider.scopes.join(" "),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Where the user agent is sent to start the sign-in.
    pub fn authorize_url(&self, state: &str) -> Url {
        let mut url = self.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", self.redirect_url.as_str())
            .append_pair("response_type", "code")
            .append_pair("scope", &self.scopes)
            .append_pair("state", state)
            .append_pair("prompt", "select_account");
        url
    }

    #[tracing::instrument(name = "oauth_exchange_code", skip_all, fields(provider = %self.id))]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse> {
        let token = self
            .http_client
            .post(self.token_url.clone())
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.expose_secret()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<TokenResponse>()
            .await?;

        Ok(token)
    }

    #[tracing::instrument(name = "oauth_fetch_profile", skip_all, fields(provider = %self.id))]
    pub async fn fetch_profile(&self, token: &TokenResponse) -> Result<ProviderProfile> {
        let profile = self
            .http_client
            .get(self.userinfo_url.clone())
            .bearer_auth(token.access_token.expose_secret())
            .send()
            .await?
            .error_for_status()?
            .json::<ProviderProfile>()
            .await?;

        Ok(profile)
    }

    /// Exchanges the authorization code and returns the signed-in user's profile.
    pub async fn authenticate(&self, code: &str) -> Result<ProviderProfile> {
        let token = self.exchange_code(code).await?;
        self.fetch_profile(&token).await
    }
}

/// All configured providers, in configuration order. The first one is the default.
#[derive(Debug)]
pub struct IdentityProviders(Vec<OAuthClient>);

impl IdentityProviders {
    pub fn from_config(auth_config: &AuthConfig, base_url: &str) -> Result<Self> {
        if auth_config.providers.is_empty() {
            return Err(Error::NoProviders);
        }

        let http_client = Client::builder().timeout(auth_config.timeout()).build()?;
        let clients = auth_config
            .providers
            .iter()
            .map(|provider| OAuthClient::new(provider, base_url, http_client.clone()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self(clients))
    }

    pub fn get(&self, id: &str) -> Option<&OAuthClient> {
        self.0.iter().find(|client| client.id() == id)
    }

    pub fn default_provider(&self) -> &OAuthClient {
        // `from_config` refuses an empty provider list.
        &self.0[0]
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
    #[error("no identity providers configured")]
    NoProviders,
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
}
