//! # rt-store-memory
//!
//! In-process implementation of `MessageStore`, keyed by id.
//! Contents are lost on restart; suited to tests and throwaway demos.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rt_core::error::{AppError, Result};
use rt_core::models::{newest_first, Message, MessageRecord, NewMessage};
use rt_core::traits::MessageStore;
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryMessageStore {
    records: DashMap<String, MessageRecord>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, message: NewMessage) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        match self.records.entry(id.clone()) {
            Entry::Occupied(_) => Err(AppError::Storage(format!("message id {id} already in use"))),
            Entry::Vacant(slot) => {
                slot.insert(MessageRecord::from(&message));
                Ok(id)
            }
        }
    }

    async fn fetch(&self, id: &str) -> Result<Message> {
        let record = self
            .records
            .get(id)
            .map(|r| r.value().clone())
            .ok_or_else(|| AppError::message_not_found(id))?;
        record.into_message(id)
    }

    async fn list_all(&self) -> Result<Vec<Message>> {
        let mut messages = self
            .records
            .iter()
            .map(|r| r.value().clone().into_message(r.key().as_str()))
            .collect::<Result<Vec<_>>>()?;
        newest_first(&mut messages);
        Ok(messages)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.records
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| AppError::message_not_found(id))
    }

    async fn clear_all(&self) -> Result<()> {
        self.records.clear();
        Ok(())
    }
}
