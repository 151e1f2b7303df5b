//! Typed client for the Caseflow REST API.
//!
//! Every authenticated call goes through [`ApiClient::request`]: a 401 triggers
//! one token refresh and one retry of the original request, never more.

mod api;
mod http;
pub mod session;

use reqwest::StatusCode;
use thiserror::Error;

pub use http::ApiClient;
pub use session::{FileTokenStore, MemoryTokenStore, Session, TokenStore};

/// Default API base used when `CASEFLOW_API_URL` is not set
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{message} (HTTP {status})")]
    Api { status: StatusCode, message: String },

    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error("You do not have permission to perform this action.")]
    Forbidden,

    #[error("Not logged in")]
    NotAuthenticated,

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status behind the error, when the server answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Forbidden => Some(StatusCode::FORBIDDEN),
            ClientError::SessionExpired => Some(StatusCode::UNAUTHORIZED),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
