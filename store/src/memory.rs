//! In-memory reference store.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use atelier_types::{
    Conversation, ConversationId, ConversationStatus, Message, MessageStatus,
};
use chrono::{TimeDelta, Utc};

use crate::{ConversationStore, StoreError};

#[derive(Debug)]
struct Record {
    conversation: Conversation,
    messages: Vec<Message>,
}

/// Reference [`ConversationStore`] backed by a mutex-guarded map.
///
/// Used by the sweeper's tests and small single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<ConversationId, Record>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a conversation and its messages.
    pub fn insert(&self, conversation: Conversation, messages: Vec<Message>) {
        let mut records = self.records.lock().expect("store mutex poisoned");
        records.insert(
            conversation.id,
            Record {
                conversation,
                messages,
            },
        );
    }

    #[must_use]
    pub fn status_of(&self, id: ConversationId) -> Option<ConversationStatus> {
        let records = self.records.lock().expect("store mutex poisoned");
        records.get(&id).map(|r| r.conversation.status)
    }

    #[must_use]
    pub fn messages_of(&self, id: ConversationId) -> Vec<Message> {
        let records = self.records.lock().expect("store mutex poisoned");
        records.get(&id).map(|r| r.messages.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn list_stuck(&self, threshold: Duration) -> Result<Vec<Conversation>, StoreError> {
        let threshold = TimeDelta::from_std(threshold).unwrap_or(TimeDelta::MAX);
        let now = Utc::now();
        let records = self.records.lock().expect("store mutex poisoned");
        Ok(records
            .values()
            .filter(|r| r.conversation.is_stale(threshold, now))
            .map(|r| r.conversation.clone())
            .collect())
    }

    async fn recover_stream_by_id(&self, id: ConversationId) -> Result<(), StoreError> {
        let mut records = self.records.lock().expect("store mutex poisoned");
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if !record.conversation.status.is_running() {
            // Already recovered (or finished some other way).
            return Ok(());
        }

        for message in &mut record.messages {
            if message.status == MessageStatus::Pending {
                message.status = MessageStatus::Failed;
            }
        }
        record.conversation.status = ConversationStatus::Recovered;
        record.conversation.updated_at = Utc::now();
        tracing::debug!(conversation = %id, "recovered stuck conversation");
        Ok(())
    }
}
