//! Wire-level turn and content-block types.
//!
//! Serialization matches the LLM API exactly: externally tagged camelCase
//! blocks, e.g. `{"text": …}`, `{"toolUse": {"toolUseId", "name", "input"}}`,
//! `{"toolResult": {"toolUseId", "content": [{"text": …}], "status"}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolUseBlock {
    pub tool_use_id: String,
    pub name: String,
    pub input: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultContent {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub content: Vec<ToolResultContent>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentBlock {
    Text(String),
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

impl ContentBlock {
    #[must_use]
    pub fn is_tool_block(&self) -> bool {
        matches!(self, ContentBlock::ToolUse(_) | ContentBlock::ToolResult(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: Vec<ContentBlock>,
}

impl Turn {
    #[must_use]
    pub fn new(role: TurnRole, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    #[must_use]
    pub fn text(role: TurnRole, text: impl Into<String>) -> Self {
        Self::new(role, vec![ContentBlock::Text(text.into())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_block_wire_shape() {
        let block = ContentBlock::Text("hi".to_string());
        assert_eq!(serde_json::to_value(&block).unwrap(), json!({"text": "hi"}));
    }

    #[test]
    fn tool_use_block_wire_shape() {
        let block = ContentBlock::ToolUse(ToolUseBlock {
            tool_use_id: "t1".to_string(),
            name: "search".to_string(),
            input: json!({"query": "rust"}),
        });
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"toolUse": {"toolUseId": "t1", "name": "search", "input": {"query": "rust"}}})
        );
    }

    #[test]
    fn tool_result_block_wire_shape() {
        let block = ContentBlock::ToolResult(ToolResultBlock {
            tool_use_id: "t1".to_string(),
            content: vec![ToolResultContent {
                text: "result".to_string(),
            }],
            status: "success".to_string(),
        });
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({"toolResult": {
                "toolUseId": "t1",
                "content": [{"text": "result"}],
                "status": "success"
            }})
        );
    }

    #[test]
    fn turn_roles_serialize_lowercase() {
        let turn = Turn::text(TurnRole::Assistant, "ok");
        assert_eq!(
            serde_json::to_value(&turn).unwrap(),
            json!({"role": "assistant", "content": [{"text": "ok"}]})
        );
    }
}
