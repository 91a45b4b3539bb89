//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;

use crate::credentials::CredentialTable;
use crate::error::Result;
use crate::models::{Message, NewMessage};

/// Persistence contract for messages.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Persists a new record under a freshly generated id and returns the id.
    /// Never overwrites an existing record.
    async fn create(&self, message: NewMessage) -> Result<String>;

    /// Loads one record. `AppError::NotFound` when nothing lives at `id`.
    async fn fetch(&self, id: &str) -> Result<Message>;

    /// Every record, most recent first.
    async fn list_all(&self) -> Result<Vec<Message>>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Removes every record, reporting a single outcome.
    async fn clear_all(&self) -> Result<()>;

    async fn list_sent_by(&self, username: &str) -> Result<Vec<Message>> {
        let mut all = self.list_all().await?;
        all.retain(|m| m.from == username);
        Ok(all)
    }

    async fn list_received_by(&self, username: &str) -> Result<Vec<Message>> {
        let mut all = self.list_all().await?;
        all.retain(|m| m.to == username);
        Ok(all)
    }
}

/// Source of the username/password table.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Reads the table. Implementations must not cache between calls.
    async fn load(&self) -> Result<CredentialTable>;

    /// Verifies a username/password pair. The username is used as given.
    async fn check(&self, username: &str, password: &str) -> Result<bool> {
        Ok(self.load().await?.check(username, password))
    }

    /// Every known username, sorted.
    async fn usernames(&self) -> Result<Vec<String>> {
        Ok(self.load().await?.usernames())
    }
}
