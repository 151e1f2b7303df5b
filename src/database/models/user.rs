use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::ValidationErrors;

/// The first account created by bootstrap. It never appears in user administration.
pub const PROTECTED_USER_ID: i64 = 1;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_staff: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
}

/// Public representation of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub is_admin: bool,
    #[serde(default)]
    pub is_staff: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            is_admin: user.is_admin,
            is_staff: user.is_staff,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub is_staff: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl CreateUserRequest {
    /// Returns the trimmed username and the password once both pass validation
    pub fn validate(&self, min_password_length: usize) -> Result<(String, String), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let username = self.username.as_deref().map(str::trim).unwrap_or_default();
        errors.require_text("username", username);

        let password = self.password.as_deref().unwrap_or_default();
        errors.require_text("password", password);
        if !password.is_empty() && password.chars().count() < min_password_length {
            errors.add(
                "password",
                format!("Ensure this field has at least {} characters.", min_password_length),
            );
        }

        errors.into_result()?;
        Ok((username.to_string(), password.to_string()))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub username: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Some(username) = &self.username {
            errors.require_text("username", username);
        }
        errors.into_result()
    }

    pub fn apply(self, user: &mut User) {
        if let Some(username) = self.username {
            user.username = username.trim().to_string();
        }
        if let Some(is_admin) = self.is_admin {
            user.is_admin = is_admin;
            user.is_staff = is_admin;
        }
    }
}
