//! # Domain Models
//!
//! These structs represent the core entities of RocketTalk.
//! Message ids are UUID v4 strings; they live in the storage key, never in
//! the persisted payload.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AppError, Result};

/// Timestamp format used in persisted records and on rendered pages.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A private message between two users. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Recovered from the storage key
    pub id: String,
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub time: NaiveDateTime,
}

impl Message {
    /// The send time formatted for display.
    pub fn sent_at(&self) -> String {
        self.time.format(DATE_FORMAT).to_string()
    }

    /// Whether `username` is the sender or the recipient (exact match).
    pub fn involves(&self, username: &str) -> bool {
        self.to == username || self.from == username
    }
}

/// A message before the store has assigned it an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub time: NaiveDateTime,
}

/// The persisted payload: exactly the five data fields.
///
/// Unknown keys (an `id` included) make the record unreadable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRecord {
    pub to: String,
    pub from: String,
    pub subject: String,
    pub body: String,
    pub time: String,
}

impl From<&NewMessage> for MessageRecord {
    fn from(msg: &NewMessage) -> Self {
        Self {
            to: msg.to.clone(),
            from: msg.from.clone(),
            subject: msg.subject.clone(),
            body: msg.body.clone(),
            time: msg.time.format(DATE_FORMAT).to_string(),
        }
    }
}

impl MessageRecord {
    /// Attaches the id taken from the storage key and parses the timestamp.
    pub fn into_message(self, id: impl Into<String>) -> Result<Message> {
        let id = id.into();
        let time = NaiveDateTime::parse_from_str(&self.time, DATE_FORMAT).map_err(|e| {
            AppError::Storage(format!("record {id} has a malformed time {:?}: {e}", self.time))
        })?;
        Ok(Message {
            id,
            to: self.to,
            from: self.from,
            subject: self.subject,
            body: self.body,
            time,
        })
    }
}

/// Orders messages most recent first. Equal timestamps keep no particular order.
pub fn newest_first(messages: &mut [Message]) {
    messages.sort_by(|a, b| b.time.cmp(&a.time));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Success,
    Danger,
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertKind::Success => f.write_str("success"),
            AlertKind::Danger => f.write_str("danger"),
        }
    }
}

/// A one-shot notification shown to the user after a redirect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
}

impl Alert {
    pub fn success(message: impl Into<String>) -> Self {
Self {
            kind: AlertKind::Success,
            message: message.into(),
        }
    }

    pub fn danger(message: impl Into<String>) -> Self {
Self {
            kind: AlertKind::Danger,
            message: message.into(),
        }
    }
}
