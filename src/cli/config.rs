use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use crate::client::{ApiClient, FileTokenStore, TokenStore, DEFAULT_API_URL};

pub fn get_config_dir() -> anyhow::Result<PathBuf> {
    let config_dir = if let Ok(custom_dir) = std::env::var("CASEFLOW_CLI_CONFIG_DIR") {
        PathBuf::from(custom_dir)
    } else {
        let home = std::env::var("HOME").map_err(|_| anyhow::anyhow!("HOME environment variable not set"))?;
        PathBuf::from(home).join(".config").join("caseflow")
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

pub fn session_store() -> anyhow::Result<FileTokenStore> {
    Ok(FileTokenStore::new(get_config_dir()?.join("session.json")))
}

/// API base URL: explicit argument, then `CASEFLOW_API_URL`, then the
/// server of the stored session, then the local default
pub fn resolve_api_url(explicit: Option<String>, store: &dyn TokenStore) -> anyhow::Result<String> {
    if let Some(url) = explicit {
        return Ok(url);
    }
    if let Ok(url) = std::env::var("CASEFLOW_API_URL") {
        if !url.trim().is_empty() {
            return Ok(url);
        }
    }
    Ok(store
        .load()?
        .server_url
        .unwrap_or_else(|| DEFAULT_API_URL.to_string()))
}

/// Client backed by the on-disk session
pub fn build_client(explicit_url: Option<String>) -> anyhow::Result<ApiClient> {
    let store = session_store()?;
    let url = resolve_api_url(explicit_url, &store)?;
    Ok(ApiClient::new(&url, Arc::new(store))?)
}
