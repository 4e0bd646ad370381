//! The logged-in session: bearer token plus the user it belongs to,
//! persisted between CLI invocations.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{CozyError, CozyResult};
use crate::model::{AuthResponse, User};

/// Sessions last as long as the login cookie did.
pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(auth: AuthResponse, now: DateTime<Utc>) -> Self {
        Session {
            token: auth.token,
            user: auth.user,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Reads and writes the session file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore { path: path.into() }
    }

    /// `~/.local/share/cozy/session.json` (platform equivalent elsewhere).
    pub fn default_path() -> CozyResult<PathBuf> {
        Ok(dirs::data_dir()
            .ok_or_else(|| CozyError::Session("Could not determine data directory".into()))?
            .join("cozy")
            .join("session.json"))
    }

    pub fn open_default() -> CozyResult<Self> {
        Ok(SessionStore::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored session, if there is one and it has not expired.
    /// An expired session file is removed.
    pub fn load(&self) -> CozyResult<Option<Session>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let session: Session = serde_json::from_str(&contents).map_err(|e| {
            CozyError::Session(format!("Could not read {}: {e}", self.path.display()))
        })?;

        if session.is_expired(Utc::now()) {
            debug!(path = %self.path.display(), "session expired");
            self.clear()?;
            return Ok(None);
        }

        Ok(Some(session))
    }

    pub fn save(&self, session: &Session) -> CozyResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        debug!(path = %self.path.display(), user_id = session.user.id, "session saved");
        Ok(())
    }

    /// Returns whether a session file was removed.
    pub fn clear(&self) -> CozyResult<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&self.path)?;
        Ok(true)
    }
}
