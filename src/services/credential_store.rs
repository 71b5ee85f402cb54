use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use tempfile::NamedTempFile;

use crate::errors::AuthError;
use crate::models::credential::Credential;

/// The external consent exchange the store falls back to when no usable credential is cached.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorizationFlow: Send + Sync {
    /// Runs an interactive authorization for `scopes`.
    async fn authorize(&self, scopes: &[String]) -> Result<Credential, AuthError>;

    /// Exchanges the refresh token of an expired credential for a new access token.
    async fn refresh(&self, credential: &Credential) -> Result<Credential, AuthError>;
}

/// Owns the single cached credential file.
pub struct CredentialStore {
    path: PathBuf,
    flow: Box<dyn AuthorizationFlow>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, flow: Box<dyn AuthorizationFlow>) -> Self {
        CredentialStore {
            path: path.into(),
            flow,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a credential covering `required_scopes`, re-authorizing when the cache
    /// is missing, malformed, under-scoped or expired beyond refresh.
    pub async fn obtain(&self, required_scopes: &[String]) -> Result<Credential, AuthError> {
        if let Some(cached) = self.load() {
            if !cached.covers(required_scopes) {
                info!("Cached credential lacks required scopes, re-authorizing");
            } else if !cached.is_expired(Utc::now()) {
                debug!("Using cached credential from {}", self.path.display());
                return Ok(cached);
            } else if cached.refresh_token.is_some() {
                info!("Cached credential expired, refreshing");
                match self.flow.refresh(&cached).await {
                    Ok(refreshed) if refreshed.covers(required_scopes) => {
                        self.persist(&refreshed);
                        return Ok(refreshed);
                    }
                    Ok(_) => warn!("Refreshed credential lost required scopes, re-authorizing"),
                    Err(e) => warn!("Token refresh failed, re-authorizing: {}", e),
                }
            } else {
                info!("Cached credential expired without a refresh token, re-authorizing");
            }
        }

        let credential = self.flow.authorize(required_scopes).await?;
        self.persist(&credential);
        Ok(credential)
    }

    /// Reads the cached credential. Anything unreadable counts as absent.
    pub fn load(&self) -> Option<Credential> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cached credential at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Could not read credential cache {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(credential) => Some(credential),
            Err(e) => {
                warn!("Ignoring malformed credential cache {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Writes the credential to a sibling temp file and renames it over the cache.
    pub fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, credential)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| AuthError::Io(e.error))?;

        info!("Saved credential file to {}", self.path.display());
        Ok(())
    }

    // The credential is usable for this run even if caching it fails.
    fn persist(&self, credential: &Credential) {
        if let Err(e) = self.save(credential) {
            warn!("Unable to cache credential at {}: {}", self.path.display(), e);
        }
    }
}
