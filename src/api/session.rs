//! Persisted session storage
//!
//! Holds the bearer token attached to every API request. The token is kept in
//! memory and mirrored to a JSON file so it survives between runs.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur when loading or saving the session
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the session file failed
    #[error("Session file error: {0}")]
    Io(#[from] std::io::Error),

    /// The session file is not valid JSON
    #[error("Invalid session file: {0}")]
    Json(#[from] serde_json::Error),

    /// No per-user data directory is available
    #[error("Could not determine a data directory for the session file")]
    NoDataDir,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    token: String,
    saved_at: DateTime<Utc>,
}

/// Bearer-token store with optional on-disk persistence
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    token: RwLock<Option<String>>,
}

impl SessionStore {
    /// Opens the session stored in the per-user data directory
    pub fn open_default() -> Result<Self, SessionError> {
        let dirs = ProjectDirs::from("", "", "healthtrack").ok_or(SessionError::NoDataDir)?;
        Self::open(dirs.data_dir().join("session.json"))
    }

    /// Opens the session stored at `path`
    ///
    /// A missing file starts logged out. So does an unreadable one, which is
    /// deleted so the next login can write a fresh session.
    pub fn open(path: PathBuf) -> Result<Self, SessionError> {
        let token = load_token(&path)?;
        Ok(Self {
            path: Some(path),
            token: RwLock::new(token),
        })
    }

    /// Creates a session that is never written to disk
    pub fn in_memory(token: Option<String>) -> Self {
        Self {
            path: None,
            token: RwLock::new(token),
        }
    }

    /// Returns the current bearer token, if logged in
    pub fn token(&self) -> Option<String> {
        self.token.read().clone()
    }

    /// Stores a new bearer token
    pub fn save(&self, token: &str) -> Result<(), SessionError> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = SessionFile {
                token: token.to_string(),
                saved_at: Utc::now(),
            };
            fs::write(path, serde_json::to_string_pretty(&file)?)?;
        }
        *self.token.write() = Some(token.to_string());
        Ok(())
    }

    /// Forgets the token and deletes the session file
    pub fn clear(&self) -> Result<(), SessionError> {
        *self.token.write() = None;
        if let Some(path) = &self.path {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

fn load_token(path: &Path) -> Result<Option<String>, SessionError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    match serde_json::from_str::<SessionFile>(&content) {
        Ok(file) => Ok(Some(file.token)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "discarding unreadable session file");
            if let Err(e) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %e, "failed to remove session file");
            }
            Ok(None)
        }
    }
}
