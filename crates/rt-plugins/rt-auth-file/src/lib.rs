//! # rt-auth-file
//!
//! JSON-file implementation of `CredentialStore`.
//! The file is a single object mapping lowercase usernames to plaintext
//! passwords. It is re-read on every call, so edits take effect immediately.

use async_trait::async_trait;
use rt_core::credentials::CredentialTable;
use rt_core::error::{AppError, Result};
use rt_core::traits::CredentialStore;
use std::path::PathBuf;
use tokio::fs;

pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<CredentialTable> {
        let raw = fs::read(&self.path).await.map_err(|e| {
            AppError::Storage(format!("cannot read {}: {e}", self.path.display()))
        })?;
        Ok(serde_json::from_slice(&raw)?)
    }
}
