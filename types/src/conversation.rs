//! Conversation lifecycle model.
//!
//! A conversation is created `Pending`, moves to `Running` while a streaming
//! turn is in flight, and ends in one of the terminal states. `Recovered` is
//! the state the liveness sweep forces a stuck `Running` conversation into
//! after its producer vanished without a completion signal.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ConversationId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
    Recovered,
}

impl ConversationStatus {
    /// Whether a streaming producer is expected to be actively updating
    /// this conversation.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, ConversationStatus::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    pub status: ConversationStatus,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    #[must_use]
    pub fn new(id: ConversationId, status: ConversationStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            id,
            status,
            updated_at,
        }
    }

    /// True iff this conversation claims an active producer but has not been
    /// touched within `threshold` of `now`.
    ///
    /// Staleness is relative to the conversation's own `updated_at`, not to
    /// process lifetime, so a restart does not mass-trigger recovery for
    /// recently-active conversations.
    #[must_use]
    pub fn is_stale(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        self.status.is_running() && self.updated_at < now - threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn running_and_old_is_stale() {
        let conv = Conversation::new(
            ConversationId::new(1),
            ConversationStatus::Running,
            at(1_000),
        );
        assert!(conv.is_stale(Duration::minutes(5), at(1_000 + 301)));
    }

    #[test]
    fn running_but_fresh_is_not_stale() {
        let conv = Conversation::new(
            ConversationId::new(1),
            ConversationStatus::Running,
            at(1_000),
        );
        assert!(!conv.is_stale(Duration::minutes(5), at(1_000 + 299)));
    }

    #[test]
    fn terminal_states_are_never_stale() {
        for status in [
            ConversationStatus::Pending,
            ConversationStatus::Completed,
            ConversationStatus::Failed,
            ConversationStatus::Cancelled,
            ConversationStatus::Recovered,
        ] {
            let conv = Conversation::new(ConversationId::new(1), status, at(0));
            assert!(!conv.is_stale(Duration::minutes(5), at(1_000_000)));
        }
    }
}
