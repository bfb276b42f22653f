use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Minutes a saved session is reused before signing in again.
const SESSION_REUSE_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// `Cookie` header value replayed on every request
    pub cookie: String,
    pub host: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.created_at + Duration::minutes(SESSION_REUSE_MINUTES)
    }

    /// True if this session was opened for the given site and user.
    pub fn belongs_to(&self, host: &str, username: &str) -> bool {
        self.host == host && self.username == username
    }
}

pub struct Session {
    cache_dir: PathBuf,
    pub data: Option<SessionData>,
}

impl Session {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir,
            data: None,
        }
    }

    /// Load session from disk. Returns true if an unexpired session was found.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: SessionData = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired() {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let Some(ref data) = self.data {
            let path = self.session_path();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    pub fn update(&mut self, data: SessionData) {
        self.data = Some(data);
    }

    /// The saved session, if it is valid for `host` and `username`.
    pub fn reusable_for(&self, host: &str, username: &str) -> Option<&SessionData> {
        self.data
            .as_ref()
            .filter(|d| !d.is_expired() && d.belongs_to(host, username))
    }

    fn session_path(&self) -> PathBuf {
        self.cache_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn data(created_at: DateTime<Utc>) -> SessionData {
        SessionData {
            cookie: "TSID1=abc".to_string(),
            host: "https://acme.ct-teamworx.com".to_string(),
            username: "me@x.com".to_string(),
            created_at,
        }
    }

    #[test]
    fn test_session_expiry() {
        assert!(!data(Utc::now()).is_expired());
        assert!(data(Utc::now() - Duration::minutes(31)).is_expired());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(data(Utc::now()));
        session.save().unwrap();

        let mut loaded = Session::new(dir.path().to_path_buf());
        assert!(loaded.load().unwrap());
        assert!(loaded
            .reusable_for("https://acme.ct-teamworx.com", "me@x.com")
            .is_some());
        assert!(loaded
            .reusable_for("https://acme.ct-teamworx.com", "someone@else.com")
            .is_none());
    }

    #[test]
    fn test_expired_session_not_loaded() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(data(Utc::now() - Duration::hours(2)));
        session.save().unwrap();

        let mut loaded = Session::new(dir.path().to_path_buf());
        assert!(!loaded.load().unwrap());
        assert!(loaded.data.is_none());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::new(dir.path().to_path_buf());
        session.update(data(Utc::now()));
        session.save().unwrap();
        session.clear().unwrap();
        assert!(!dir.path().join(SESSION_FILE).exists());
    }
}
