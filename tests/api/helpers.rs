//! Spawns the whole app on a random port, backed by an in-memory prayer store and a
//! `wiremock` server standing in for the identity provider.
use std::sync::{Arc, OnceLock};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, Response, StatusCode, Url};
use serde_json::json;
use spiritual_cookie::{
    config::{get_or_init_config, SessionBackendKind},
    init_dbg_tracing,
    model::{self, MemoryStore, PrayerRecord, PrayerStore},
    App,
};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const AUTH_PATH: &str = "/o/oauth2/v2/auth";
pub const TOKEN_PATH: &str = "/token";
pub const USERINFO_PATH: &str = "/userinfo";

pub struct TestApp {
    pub addr: String,
    pub http_client: Client,
    pub provider_server: MockServer,
}

/// A store whose every insert fails.
pub struct FailingStore;

#[async_trait]
impl PrayerStore for FailingStore {
    async fn insert(&self, _record: &PrayerRecord) -> model::Result<()> {
        Err(model::Error::StoreUnavailable("store is down".to_string()))
    }
}

fn _init_test_subscriber() {
    static SUBSCRIBER: OnceLock<()> = OnceLock::new();
    SUBSCRIBER.get_or_init(|| {
        init_dbg_tracing();
    });
}

impl TestApp {
    /// Spawns the app with a fresh `MemoryStore`, returned alongside so tests can inspect it.
    pub async fn spawn() -> Result<(Self, Arc<MemoryStore>)> {
        let store = Arc::new(MemoryStore::new());
        let app = Self::spawn_with_store(store.clone()).await?;
        Ok((app, store))
    }

    /// A helper function that tries to spawn a separate thread to serve our app
    /// returning the *socket address* on which it is listening.
    pub async fn spawn_with_store(store: Arc<dyn PrayerStore>) -> Result<Self> {
        // _init_test_subscriber();
        let provider_server = MockServer::start().await;

        let mut config = get_or_init_config().clone();
        // Trying to bind port 0 will trigger an OS scan for an available port.
        config.net_config.host = [127, 0, 0, 1];
        config.net_config.app_port = 0;
        config.session_config.backend = SessionBackendKind::Memory;
        // reqwest's cookie store won't send `Secure` cookies over plain http
        config.session_config.secure = false;
        for provider in config.auth_config.providers.iter_mut() {
            provider.auth_url = format!("{}{AUTH_PATH}", provider_server.uri());
            provider.token_url = format!("{}{TOKEN_PATH}", provider_server.uri());
            provider.userinfo_url = format!("{}{USERINFO_PATH}", provider_server.uri());
        }

        let app = App::build_with_store(config, store).await?;
        let addr = format!("http://{}", app.listener.local_addr()?);
        tokio::spawn(spiritual_cookie::serve(app));

        let http_client = Client::builder()
            .redirect(Policy::none())
            .cookie_store(true)
            .build()?;

        Ok(TestApp {
            addr,
            http_client,
            provider_server,
        })
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self
            .http_client
            .get(format!("{}{path}", self.addr))
            .send()
            .await?)
    }

    pub async fn get_html(&self, path: &str) -> Result<String> {
        Ok(self.get(path).await?.text().await?)
    }

    pub async fn post_prayer(&self, body: &serde_json::Value) -> Result<Response> {
        Ok(self
            .http_client
            .post(format!("{}/api/prayer", self.addr))
            .json(body)
            .send()
            .await?)
    }

    pub async fn session_json(&self) -> Result<serde_json::Value> {
        Ok(self.get("/api/auth/session").await?.json().await?)
    }

    /// Starts a sign-in and returns the `state` the app put into the provider redirect.
    pub async fn start_sign_in(&self) -> Result<String> {
        let resp = self.get("/api/auth/signin").await?;
        let location = assert_resp_redirect(&resp)?;
        let url = Url::parse(&location)?;

        url.query_pairs()
            .find(|(key, _)| key == "state")
            .map(|(_, state)| state.into_owned())
            .ok_or_else(|| anyhow!("no state in the provider redirect: {location}"))
    }

    /// Mounts the provider's token and userinfo endpoints, answering with `profile`.
    pub async fn mount_provider(&self, profile: serde_json::Value) {
        Mock::given(path(TOKEN_PATH))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "test-access-token",
                "token_type": "Bearer",
                "expires_in": 3599
            })))
            .mount(&self.provider_server)
            .await;

        Mock::given(path(USERINFO_PATH))
            .and(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(profile))
            .mount(&self.provider_server)
            .await;
    }

    pub async fn callback(&self, query: &str) -> Result<Response> {
        self.get(&format!("/api/auth/callback/google?{query}")).await
    }

    /// Runs the full sign-in flow for `email`. The session cookie ends up in `http_client`.
    pub async fn sign_in(&self, email: &str) -> Result<()> {
        self.mount_provider(json!({
            "sub": "109876543210",
            "email": email,
            "name": "Test User"
        }))
        .await;

        let state = self.start_sign_in().await?;
        let resp = self
            .callback(&format!("code=test-code&state={state}"))
            .await?;
        assert_resp_redirect(&resp)?;

        Ok(())
    }
}

/// Checks for a `303 See Other` and returns its `Location`.
pub fn assert_resp_redirect(resp: &Response) -> Result<String> {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let location = resp
        .headers()
        .get("location")
        .ok_or_else(|| anyhow!("redirect without a location header"))?
        .to_str()?;
    Ok(location.to_string())
}

pub fn assert_resp_redir_to(resp: &Response, target: &str) {
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        resp.headers().get("location").and_then(|l| l.to_str().ok()),
        Some(target)
    );
}
