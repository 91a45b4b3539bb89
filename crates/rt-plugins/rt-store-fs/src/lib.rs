//! # rt-store-fs
//! rocket-talk/crates/rt-plugins/rt-store-fs/src/lib.rs
//! Local filesystem implementation of `MessageStore`.
//! One JSON file per message, named `<id>.json`; the id never appears in
//! the file body.

use async_trait::async_trait;
use rt_core::error::{AppError, Result};
use rt_core::models::{newest_first, Message, MessageRecord, NewMessage};
use rt_core::traits::MessageStore;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use uuid::Uuid;

const EXTENSION: &str = "json";

pub struct FsMessageStore {
    /// Directory holding every message file (e.g., "./messages")
    root_path: PathBuf,
}

impl FsMessageStore {
    /// Opens the store, creating the directory if it does not exist yet.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root_path = root.into();
        fs::create_dir_all(&root_path).await?;
        Ok(Self { root_path })
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// Maps an id to its file. Anything that is not a UUID has no file.
    fn message_path(&self, id: &str) -> Option<PathBuf> {
        Uuid::parse_str(id).ok()?;
        Some(self.root_path.join(format!("{id}.{EXTENSION}")))
    }

    /// Lists `(id, path)` for every message file currently in the directory.
    async fn message_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut entries = fs::read_dir(&self.root_path).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            // Only names `message_path` would produce; anything else is not a message.
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(id) if Uuid::parse_str(id).is_ok() => {
                    files.push((id.to_string(), path.clone()));
                }
                _ => debug!(path = %path.display(), "ignoring non-message file"),
            }
        }
        Ok(files)
    }
}

/// Writes `payload` through `writer`. On failure the half-written file at
/// `path` is removed so it never shows up as a corrupt record.
async fn write_or_discard<W>(mut writer: W, path: &Path, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        writer.write_all(payload).await?;
        writer.flush().await
    }
    .await;
    drop(writer);

    if let Err(e) = written {
        if let Err(cleanup) = fs::remove_file(path).await {
            warn!(path = %path.display(), error = %cleanup, "failed to remove partial message");
        }
        return Err(AppError::Storage(format!("cannot write {}: {e}", path.display())));
    }
    Ok(())
}

#[async_trait]
impl MessageStore for FsMessageStore {
    /// Writes the record with exclusive creation, so an id collision fails
    /// instead of clobbering an existing message.
    async fn create(&self, message: NewMessage) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let path = self.root_path.join(format!("{id}.{EXTENSION}"));
        let payload = serde_json::to_vec(&MessageRecord::from(&message))?;

        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| AppError::Storage(format!("cannot create {}: {e}", path.display())))?;
        write_or_discard(file, &path, &payload).await?;

        debug!(%id, path = %path.display(), "message written");
        Ok(id)
    }

    async fn fetch(&self, id: &str) -> Result<Message> {
        let path = self
            .message_path(id)
            .ok_or_else(|| AppError::message_not_found(id))?;
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(AppError::message_not_found(id))
            }
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice::<MessageRecord>(&raw)?.into_message(id)
    }

    async fn list_all(&self) -> Result<Vec<Message>> {
        let mut messages = Vec::new();
        for (id, path) in self.message_files().await? {
            let raw = match fs::read(&path).await {
                Ok(raw) => raw,
                // Removed between the directory listing and the read.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            let parsed = serde_json::from_slice::<MessageRecord>(&raw)
                .map_err(AppError::from)
                .and_then(|record| record.into_message(id.as_str()));
            match parsed {
                Ok(message) => messages.push(message),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable message"),
            }
        }
        newest_first(&mut messages);
        Ok(messages)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = self
            .message_path(id)
            .ok_or_else(|| AppError::message_not_found(id))?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::message_not_found(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Tries every file, then reports one outcome for the whole batch.
    async fn clear_all(&self) -> Result<()> {
        let files = self.message_files().await?;
        let total = files.len();
        let mut failed = 0usize;
        for (_, path) in files {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "failed to remove message");
                    failed += 1;
                }
            }
        }
        if failed > 0 {
            return Err(AppError::Storage(format!(
                "failed to remove {failed} of {total} messages"
            )));
        }
        Ok(())
    }
}
