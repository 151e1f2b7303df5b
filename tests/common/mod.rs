#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{extract::Request, ServiceExt};
use reqwest::StatusCode;
use serde_json::{json, Value};

use caseflow_api::config::AppConfig;
use caseflow_api::database::{MemoryStore, Store};
use caseflow_api::{app, services, AppState};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-pass";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.api.enable_request_logging = false;
    config.security.jwt_secret = "caseflow-test-secret".to_string();
    config.bootstrap.admin_username = Some(ADMIN_USERNAME.to_string());
    config.bootstrap.admin_password = Some(ADMIN_PASSWORD.to_string());
    // Lowest bcrypt cost keeps logins fast
    config.security.password_hash_cost = 4;
    config
}

/// State over a fresh in-memory store with the bootstrap admin created
pub async fn test_state(config: AppConfig) -> Result<AppState> {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
    services::ensure_admin(store.as_ref(), &config).await?;
    Ok(AppState::new(store, config))
}

/// A server running inside the test's runtime on its own port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    /// Base for API calls, e.g. `http://127.0.0.1:4242/api`
    pub api_url: String,
    pub state: AppState,
    http: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let state = test_state(config).await?;

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
        let service = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, ServiceExt::<Request>::into_make_service(service)).await;
        });

        let server = Self {
            port,
            api_url: format!("{}/api", base_url),
            base_url,
            state,
            http: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.http.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Log in and return `(access, refresh)`
    pub async fn login(&self, username: &str, password: &str) -> Result<(String, String)> {
        let res = self
            .http
            .post(self.url("/auth/login/"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;
        let data = &body["data"];
        Ok((
            data["access"].as_str().context("access token")?.to_string(),
            data["refresh"].as_str().context("refresh token")?.to_string(),
        ))
    }

    pub async fn admin_token(&self) -> Result<String> {
        Ok(self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await?.0)
    }

    /// Create a user through the admin API and return an access token for them
    pub async fn user_token(&self, username: &str, is_admin: bool) -> Result<String> {
        let admin = self.admin_token().await?;
        let res = self
            .http
            .post(self.url("/users/"))
            .bearer_auth(&admin)
            .json(&json!({ "username": username, "password": "secret-pw", "is_admin": is_admin }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "user create failed: {}", res.status());
        Ok(self.login(username, "secret-pw").await?.0)
    }

    /// Send an authenticated JSON request, returning status and parsed body (Null when empty)
    pub async fn call(
        &self,
        method: reqwest::Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut req = self.http.request(method, self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok((status, value))
    }
}
