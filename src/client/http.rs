use reqwest::{header, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::{ClientError, ClientResult, MemoryTokenStore, TokenStore};
use crate::auth::{AccessToken, RefreshRequest};

/// HTTP client bound to one API base URL and one token store
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    pub(super) tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    /// `base_url` includes the API prefix, e.g. `http://localhost:8000/api`
    pub fn new(base_url: &str, tokens: Arc<dyn TokenStore>) -> ClientResult<Self> {
        let base_url = Url::parse(base_url.trim_end_matches('/'))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, base_url, tokens })
    }

    /// Client with an in-memory session
    pub fn in_memory(base_url: &str) -> ClientResult<Self> {
        Self::new(base_url, Arc::new(MemoryTokenStore::new()))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn token_store(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }

    pub(super) fn url(&self, endpoint: &str) -> ClientResult<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let endpoint = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, endpoint))?)
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        access: Option<&str>,
    ) -> ClientResult<Response> {
        let mut request = self
            .http
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(token) = access {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Send an authenticated request and return the unwrapped `data` payload.
    ///
    /// On a 401 the access token is refreshed once and the request retried
    /// once. If the refresh fails the stored session is cleared and
    /// [`ClientError::SessionExpired`] is returned.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> ClientResult<Option<Value>> {
        let url = self.url(endpoint)?;
        let session = self.tokens.load()?;

        let mut response = self
            .send(method.clone(), url.clone(), body.as_ref(), session.access.as_deref())
            .await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("{} {} returned 401, refreshing access token", method, endpoint);

            match self.refresh_access_token().await {
                Ok(access) => {
                    response = self.send(method, url, body.as_ref(), Some(&access)).await?;
                }
                Err(e) => {
                    warn!("Token refresh failed: {}", e);
                    self.tokens.clear()?;
                    return Err(ClientError::SessionExpired);
                }
            }
        }

        read_body(response).await
    }

    /// Like [`request`](Self::request) but decodes the payload into `T`
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> ClientResult<T> {
        let data = self.request(method, endpoint, body).await?.unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// Send a request without any bearer token and without the refresh policy
    pub(super) async fn request_public<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> ClientResult<T> {
        let body = serde_json::to_value(body)?;
        let response = self.send(Method::POST, self.url(endpoint)?, Some(&body), None).await?;
        let data = read_body(response).await?.unwrap_or(Value::Null);
        Ok(serde_json::from_value(data)?)
    }

    /// Exchange the stored refresh token for a new access token and store it.
    /// The refresh token is kept.
    async fn refresh_access_token(&self) -> ClientResult<String> {
        let mut session = self.tokens.load()?;
        let refresh = session.refresh.clone().ok_or(ClientError::NotAuthenticated)?;

        let token: AccessToken = self
            .request_public("/auth/refresh/", &RefreshRequest { refresh: Some(refresh) })
            .await?;

        session.access = Some(token.access.clone());
        self.tokens.save(&session)?;
        debug!("Access token refreshed");
        Ok(token.access)
    }
}

/// Turn a response into its payload, or into the matching error
async fn read_body(response: Response) -> ClientResult<Option<Value>> {
    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        if status == StatusCode::FORBIDDEN {
            return Err(ClientError::Forbidden);
        }
        return Err(ClientError::Api {
            status,
            message: error_message(status, &text),
        });
    }

    if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
        return Ok(None);
    }

    let value: Value = serde_json::from_str(&text)?;
    Ok(Some(unwrap_envelope(value)))
}

/// `{"success": true, "data": ...}` yields `data`; anything else is returned as is
fn unwrap_envelope(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("success") && map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// First of `detail`, `message`, `error` in the body, else the reason phrase
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["detail", "message", "error"]
                .iter()
                .find_map(|key| value.get(key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string())
}
