use anyhow::Context;
use tracing::{info, warn};

use crate::auth::hash_password;
use crate::config::AppConfig;
use crate::database::models::{NewUser, User};
use crate::database::Store;

/// Create the initial administrator when the user table is empty.
///
/// The first account gets id 1 and is hidden from user administration.
/// Returns `None` when users already exist or no credentials are configured.
pub async fn ensure_admin(store: &dyn Store, config: &AppConfig) -> anyhow::Result<Option<User>> {
    if store.count_users().await? > 0 {
        return Ok(None);
    }

    let bootstrap = &config.bootstrap;
    let (Some(username), Some(password)) = (&bootstrap.admin_username, &bootstrap.admin_password) else {
        warn!("No users exist and no bootstrap admin is configured; nobody will be able to log in");
        return Ok(None);
    };

    let password_hash = hash_password(password, config.security.password_hash_cost)
        .context("failed to hash the bootstrap password")?;
    let user = store
        .create_user(NewUser {
            username: username.trim().to_string(),
            password_hash,
            is_admin: true,
            is_staff: true,
        })
        .await?;

    info!("Created bootstrap administrator '{}' (id {})", user.username, user.id);
    Ok(Some(user))
}
