//! Persisted message and tool-call records.
//!
//! `Message` is the stored shape of one conversation turn, with its tool
//! calls embedded in insertion order. Only `MessageStatus::Complete`
//! messages ever participate in protocol building; failed and pending
//! messages carry partial content that must never reach the LLM.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{ConversationId, MessageId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Complete,
    Failed,
}

/// Why the model stopped producing output for this message.
///
/// `ToolUse` is the one value the protocol builder branches on: it marks an
/// assistant message that paused to invoke tools and expects results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    ToolUse,
    MaxTokens,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Pending,
    Completed,
    Failed,
}

/// One tool invocation recorded against an assistant message.
///
/// `tool_use_id` is the correlation key pairing the invocation with its
/// eventual result in the wire protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_use_id: String,
    pub tool_name: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output: Option<Value>,
    pub status: ToolCallStatus,
}

impl ToolCall {
    #[must_use]
    pub fn completed(&self) -> bool {
        matches!(self.status, ToolCallStatus::Completed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub role: Role,
    pub status: MessageStatus,
    /// Free text; may be empty (an assistant message can be pure tool use).
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stop_reason: Option<StopReason>,
    /// Tool calls in insertion order within this message.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tool_calls: Vec<ToolCall>,
}

impl Message {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        matches!(self.status, MessageStatus::Complete)
    }

    #[must_use]
    pub fn paused_for_tools(&self) -> bool {
        self.role == Role::Assistant && self.stop_reason == Some(StopReason::ToolUse)
    }
}
