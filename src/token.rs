//! Bearer token storage — a single read-only file under the storage dir.
//!
//! The token is written by whatever performs the sign-in; this client only
//! reads it, fresh on every request, and never refreshes or invalidates it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

/// Handle on `{storage_dir}/token`.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(storage_dir: &Path) -> Self {
        Self {
            path: storage_dir.join("token"),
        }
    }

    /// Current token, or an empty string when the file is missing or
    /// unreadable.
    pub fn read(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                debug!(path = %self.path.display(), "token file unavailable: {e}");
                String::new()
            }
        }
    }

    /// `Authorization` header value. Always produced, even when the token
    /// file is missing — the server decides what to reject.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.read())
    }
}
