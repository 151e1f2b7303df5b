pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::database::models::{User, UserView};

pub use password::{hash_password, verify_password, DEFAULT_COST};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: i64,
    pub username: String,
    pub is_admin: bool,
    pub token_type: TokenKind,
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn for_user(user: &User, token_type: TokenKind, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            sub: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            token_type,
            jti: Uuid::new_v4(),
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Body of `POST /auth/login/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Successful login: a token pair plus the public view of the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
    pub user: UserView,
}

/// Body of `POST /auth/refresh/`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token is invalid or expired")]
    Expired,
    #[error("Token is invalid: {0}")]
    InvalidToken(String),
    #[error("Token has wrong type")]
    WrongTokenType,
    #[error("JWT secret not configured")]
    MissingSecret,
    #[error("JWT generation error: {0}")]
    Encoding(String),
    #[error("Password hash error: {0}")]
    Hashing(String),
}

/// Issue an access/refresh pair for a freshly authenticated user
pub fn issue_pair(user: &User, security: &SecurityConfig) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access: issue_access(user, security)?,
        refresh: sign(&Claims::for_user(
            user,
            TokenKind::Refresh,
            Duration::hours(security.refresh_token_hours),
        ), security)?,
    })
}

pub fn issue_access(user: &User, security: &SecurityConfig) -> Result<String, AuthError> {
    sign(
        &Claims::for_user(user, TokenKind::Access, Duration::seconds(security.access_token_seconds)),
        security,
    )
}

fn sign(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::Encoding(e.to_string()))
}

/// Validate signature, expiry and token type, returning the claims
pub fn decode_token(token: &str, expected: TokenKind, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::MissingSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?
        .claims;

    if claims.token_type != expected {
        return Err(AuthError::WrongTokenType);
    }

    Ok(claims)
}
