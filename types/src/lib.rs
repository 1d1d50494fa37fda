//! Core domain types for Atelier.
//!
//! This crate contains pure domain types with no IO, no async, and minimal
//! dependencies. Everything here can be used from any layer of the application.

mod conversation;
mod ids;
mod message;

pub use conversation::{Conversation, ConversationStatus};
pub use ids::{ConversationId, MessageId};
pub use message::{Message, MessageStatus, Role, StopReason, ToolCall, ToolCallStatus};
