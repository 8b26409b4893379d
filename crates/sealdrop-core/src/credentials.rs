//! Persisted session token storage.
//!
//! Stores the opaque bearer token in `<home>/credentials.json` with restricted
//! permissions (0600). Tokens are never logged or displayed in full.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config::paths;

/// On-disk credentials shape.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CredentialsFile {
    /// The opaque bearer token issued by the server, if signed in.
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

/// Token persistence bound to a credentials file path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Creates a store bound to a specific credentials file.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Creates a store at the default location under the sealdrop home.
    pub fn default_path() -> Self {
        Self::new(paths::credentials_path())
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Loads the persisted token, if any.
    ///
    /// Returns `None` if the file doesn't exist or holds no token.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read credentials from {}", self.path.display()))?;

        let file: CredentialsFile = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse credentials from {}", self.path.display()))?;

        Ok(file.token.filter(|t| !t.is_empty()))
    }

    /// Persists a token, replacing any previous one.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn save(&self, token: &str) -> Result<()> {
        self.write(&CredentialsFile {
            token: Some(token.to_string()),
        })
    }

    /// Removes the persisted token. Returns whether one was present.
    ///
    /// Safe to call repeatedly; clearing an empty store is a no-op.
    ///
    /// # Errors
    /// Returns an error if the operation fails.
    pub fn clear(&self) -> Result<bool> {
        let had_token = self.load().unwrap_or(None).is_some();
        if self.path.exists() {
            self.write(&CredentialsFile::default())?;
        }
        Ok(had_token)
    }

    /// Writes the credentials file with restricted permissions (0600).
    fn write(&self, file: &CredentialsFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let contents = serde_json::to_string_pretty(file).context("Failed to serialize credentials")?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            let mut f = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&self.path)
                .with_context(|| format!("Failed to open {} for writing", self.path.display()))?;
            f.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&self.path, contents)
                .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        }

        Ok(())
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
