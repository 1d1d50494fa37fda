//! Conversation store capability.
//!
//! The rest of the system only ever sees [`ConversationStore`]: the
//! liveness sweep queries it for stuck conversations and delegates
//! recovery to it. Real deployments put a database behind this trait;
//! [`MemoryStore`] is the in-process reference implementation that
//! honors the same contract (notably: recovery is idempotent).

mod memory;

use std::time::Duration;

use async_trait::async_trait;
use atelier_types::{Conversation, ConversationId};
use thiserror::Error;

pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conversation {0} not found")]
    NotFound(ConversationId),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Query and mutation surface the sweeper depends on.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Conversations in a running state whose `updated_at` is older than
    /// `now - threshold`.
    async fn list_stuck(&self, threshold: Duration) -> Result<Vec<Conversation>, StoreError>;

    /// Recover a conversation whose streaming producer vanished: mark its
    /// in-flight message failed, transition the conversation out of the
    /// running state, and release any conversation-level claim.
    ///
    /// Idempotent: recovering a conversation that is no longer running is
    /// a no-op, not an error.
    async fn recover_stream_by_id(&self, id: ConversationId) -> Result<(), StoreError>;
}
