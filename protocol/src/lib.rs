//! Deterministic translation from persisted conversation history to the
//! ordered turn/block format the LLM wire protocol expects.
//!
//! The builder is a pure function over `atelier_types::Message` records:
//! no IO, no shared state, safe to call concurrently. Malformed history
//! (a missing correlation id, an unknown role) is unrepresentable in the
//! typed model, so this crate has no error path.

mod builder;
mod output;
mod wire;

pub use builder::{build_llm_messages, merge_consecutive, strip_tool_blocks};
pub use output::format_tool_output;
pub use wire::{ContentBlock, ToolResultBlock, ToolResultContent, ToolUseBlock, Turn, TurnRole};
