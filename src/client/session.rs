use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use super::ClientResult;
use crate::database::models::UserView;

/// Tokens and user kept between requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,
    #[serde(default)]
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
    #[serde(default)]
    pub user: Option<UserView>,
}

/// Where the client keeps its session
pub trait TokenStore: Send + Sync {
    fn load(&self) -> ClientResult<Session>;
    fn save(&self, session: &Session) -> ClientResult<()>;

    /// Forget tokens and user. The server URL is kept so the next login
    /// goes to the same server.
    fn clear(&self) -> ClientResult<()> {
        let server_url = self.load()?.server_url;
        self.save(&Session { server_url, ..Session::default() })
    }
}

/// Session held in process memory only
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    session: Mutex<Session>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self { session: Mutex::new(session) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> ClientResult<Session> {
        Ok(self.session.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = session.clone();
        Ok(())
    }
}

/// Session persisted as pretty-printed JSON, e.g. `~/.config/caseflow/session.json`
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> ClientResult<Session> {
        if !self.path.exists() {
            return Ok(Session::default());
        }

        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            server_url: Some("http://localhost:8000/api".into()),
            access: Some("a".into()),
            refresh: Some("r".into()),
            user: Some(UserView { id: 2, username: "lperez".into(), is_admin: false, is_staff: false }),
        }
    }

    #[test]
    fn file_store_persists_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().unwrap(), Session::default());
        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), session());

        store.clear().unwrap();
        let cleared = store.load().unwrap();
        assert_eq!(cleared.server_url.as_deref(), Some("http://localhost:8000/api"));
        assert!(cleared.access.is_none() && cleared.refresh.is_none() && cleared.user.is_none());
    }

    #[test]
    fn clear_keeps_only_the_server_url() {
        let store = MemoryTokenStore::with_session(session());
        store.clear().unwrap();
        assert_eq!(
            store.load().unwrap(),
            Session { server_url: Some("http://localhost:8000/api".into()), ..Session::default() }
        );
    }
}
