//! History-to-turns assembly.
//!
//! Reconstructs the wire turn sequence from persisted messages: completed
//! messages only, tool invocations paired with their results via
//! `tool_use_id`, and a final normalization pass that merges adjacent
//! same-role turns (filtering failed messages can leave two user turns
//! back to back).

use atelier_types::{Message, Role, ToolCall};
use serde_json::json;

use crate::output::format_tool_output;
use crate::wire::{ContentBlock, ToolResultBlock, ToolResultContent, ToolUseBlock, Turn, TurnRole};

/// The three shapes a completed message can take on the wire.
///
/// Classification is exhaustive: there is no ad hoc role/stop-reason
/// branching at the emit sites.
enum MessageShape<'a> {
    UserText(&'a str),
    AssistantText(&'a str),
    AssistantToolUse {
        text: &'a str,
        calls: &'a [ToolCall],
    },
}

fn classify(message: &Message) -> MessageShape<'_> {
    match message.role {
        Role::User => MessageShape::UserText(&message.content),
        Role::Assistant if message.paused_for_tools() => MessageShape::AssistantToolUse {
            text: &message.content,
            calls: &message.tool_calls,
        },
        Role::Assistant => MessageShape::AssistantText(&message.content),
    }
}

/// Build the ordered turn list for an LLM request.
///
/// Only `Complete` messages contribute; input order is preserved and turns
/// are never reordered, only merged.
#[must_use]
pub fn build_llm_messages(messages: &[Message]) -> Vec<Turn> {
    let mut turns: Vec<Turn> = Vec::new();

    for message in messages.iter().filter(|m| m.is_complete()) {
        match classify(message) {
            MessageShape::UserText(text) => {
                if !text.is_empty() {
                    turns.push(Turn::text(TurnRole::User, text));
                }
            }
            MessageShape::AssistantText(text) => {
                if !text.is_empty() {
                    turns.push(Turn::text(TurnRole::Assistant, text));
                }
            }
            MessageShape::AssistantToolUse { text, calls } => {
                let mut content: Vec<ContentBlock> = Vec::new();
                if !text.is_empty() {
                    content.push(ContentBlock::Text(text.to_string()));
                }
                for call in calls {
                    content.push(ContentBlock::ToolUse(ToolUseBlock {
                        tool_use_id: call.tool_use_id.clone(),
                        name: call.tool_name.clone(),
                        input: call.input.clone().unwrap_or_else(|| json!({})),
                    }));
                }
                if !content.is_empty() {
                    turns.push(Turn::new(TurnRole::Assistant, content));
                }

                // Failed and pending calls never produced a usable result;
                // they get a toolUse block above but no toolResult.
                let results: Vec<ContentBlock> = calls
                    .iter()
                    .filter(|call| call.completed())
                    .map(|call| {
                        ContentBlock::ToolResult(ToolResultBlock {
                            tool_use_id: call.tool_use_id.clone(),
                            content: vec![ToolResultContent {
                                text: format_tool_output(call.output.as_ref()),
                            }],
                            status: "success".to_string(),
                        })
                    })
                    .collect();
                if !results.is_empty() {
                    turns.push(Turn::new(TurnRole::User, results));
                }
            }
        }
    }

    merge_consecutive(turns)
}

/// Merge any run of adjacent same-role turns into one turn, concatenating
/// their content lists in order.
#[must_use]
pub fn merge_consecutive(turns: Vec<Turn>) -> Vec<Turn> {
    let mut merged: Vec<Turn> = Vec::with_capacity(turns.len());
    for turn in turns {
        match merged.last_mut() {
            Some(last) if last.role == turn.role => {
                last.content.extend(turn.content);
            }
            _ => merged.push(turn),
        }
    }
    merged
}

/// Remove every `toolUse`/`toolResult` block from an already-built turn
/// list, drop turns left empty, then re-normalize.
///
/// Used when retrying a conversation without tool configuration: the LLM
/// API rejects tool blocks when no tools are declared.
#[must_use]
pub fn strip_tool_blocks(turns: Vec<Turn>) -> Vec<Turn> {
    let stripped: Vec<Turn> = turns
        .into_iter()
        .map(|mut turn| {
            turn.content.retain(|block| !block.is_tool_block());
            turn
        })
        .filter(|turn| !turn.content.is_empty())
        .collect();
    merge_consecutive(stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_types::{
        ConversationId, MessageId, MessageStatus, StopReason, ToolCallStatus,
    };
    use serde_json::json;

    fn message(id: i64, role: Role, status: MessageStatus, content: &str) -> Message {
        Message {
            id: MessageId::new(id),
            conversation_id: ConversationId::new(1),
            role,
            status,
            content: content.to_string(),
            stop_reason: None,
            tool_calls: Vec::new(),
        }
    }

    fn tool_call(id: &str, name: &str, status: ToolCallStatus, output: Option<serde_json::Value>) -> ToolCall {
        ToolCall {
            tool_use_id: id.to_string(),
            tool_name: name.to_string(),
            input: Some(json!({})),
            output,
            status,
        }
    }

    fn tool_use_message(id: i64, content: &str, calls: Vec<ToolCall>) -> Message {
        Message {
            stop_reason: Some(StopReason::ToolUse),
            tool_calls: calls,
            ..message(id, Role::Assistant, MessageStatus::Complete, content)
        }
    }

    #[test]
    fn user_and_assistant_text_round() {
        let turns = build_llm_messages(&[
            message(1, Role::User, MessageStatus::Complete, "hi"),
            message(2, Role::Assistant, MessageStatus::Complete, "hello"),
        ]);
        assert_eq!(
            turns,
            vec![
                Turn::text(TurnRole::User, "hi"),
                Turn::text(TurnRole::Assistant, "hello"),
            ]
        );
    }

    #[test]
    fn incomplete_messages_contribute_nothing() {
        let turns = build_llm_messages(&[
            message(1, Role::User, MessageStatus::Complete, "hi"),
            message(2, Role::Assistant, MessageStatus::Failed, "partial garbage"),
            message(3, Role::Assistant, MessageStatus::Pending, "still streaming"),
        ]);
        assert_eq!(turns, vec![Turn::text(TurnRole::User, "hi")]);
    }

    #[test]
    fn empty_content_emits_no_turn() {
        let turns = build_llm_messages(&[
            message(1, Role::User, MessageStatus::Complete, ""),
            message(2, Role::Assistant, MessageStatus::Complete, ""),
        ]);
        assert!(turns.is_empty());
    }

    #[test]
    fn adjacent_user_turns_merge_after_filtering() {
        // A failed assistant reply removed from between two user messages
        // leaves user,user - the merge pass collapses them.
        let turns = build_llm_messages(&[
            message(1, Role::User, MessageStatus::Complete, "first"),
            message(2, Role::Assistant, MessageStatus::Failed, "dropped"),
            message(3, Role::User, MessageStatus::Complete, "second"),
        ]);
        assert_eq!(
            turns,
            vec![Turn::new(
                TurnRole::User,
                vec![
                    ContentBlock::Text("first".to_string()),
                    ContentBlock::Text("second".to_string()),
                ]
            )]
        );
    }

    #[test]
    fn no_adjacent_turns_share_a_role() {
        let turns = build_llm_messages(&[
            message(1, Role::User, MessageStatus::Complete, "a"),
            message(2, Role::User, MessageStatus::Complete, "b"),
            message(3, Role::Assistant, MessageStatus::Complete, "c"),
            message(4, Role::Assistant, MessageStatus::Complete, "d"),
            message(5, Role::User, MessageStatus::Complete, "e"),
        ]);
        for pair in turns.windows(2) {
            assert_ne!(pair[0].role, pair[1].role);
        }
    }

    #[test]
    fn tool_use_scenario_yields_three_turns() {
        // user/hi, assistant/[toolUse t1], user/[toolResult t1 "result"]
        let turns = build_llm_messages(&[
            message(1, Role::User, MessageStatus::Complete, "hi"),
            tool_use_message(
                2,
                "",
                vec![tool_call(
                    "t1",
                    "search",
                    ToolCallStatus::Completed,
                    Some(json!({"content": [{"text": "result"}]})),
                )],
            ),
        ]);

        assert_eq!(
            serde_json::to_value(&turns).unwrap(),
            json!([
                {"role": "user", "content": [{"text": "hi"}]},
                {"role": "assistant", "content": [
                    {"toolUse": {"toolUseId": "t1", "name": "search", "input": {}}}
                ]},
                {"role": "user", "content": [
                    {"toolResult": {
                        "toolUseId": "t1",
                        "content": [{"text": "result"}],
                        "status": "success"
                    }}
                ]},
            ])
        );
    }

    #[test]
    fn tool_pairing_counts_and_order() {
        // N = 3 toolUse blocks, K = 2 completed -> 2 toolResult blocks in
        // the same relative order.
        let turns = build_llm_messages(&[tool_use_message(
            1,
            "running tools",
            vec![
                tool_call("t1", "read", ToolCallStatus::Completed, Some(json!("one"))),
                tool_call("t2", "write", ToolCallStatus::Failed, None),
                tool_call("t3", "list", ToolCallStatus::Completed, Some(json!("three"))),
            ],
        )]);

        assert_eq!(turns.len(), 2);

        let uses: Vec<&str> = turns[0]
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse(u) => Some(u.tool_use_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(uses, ["t1", "t2", "t3"]);

        let results: Vec<&str> = turns[1]
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolResult(r) => Some(r.tool_use_id.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(results, ["t1", "t3"]);
    }

    #[test]
    fn no_completed_calls_means_no_synthetic_turn() {
        let turns = build_llm_messages(&[tool_use_message(
            1,
            "tried a tool",
            vec![tool_call("t1", "search", ToolCallStatus::Failed, None)],
        )]);
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, TurnRole::Assistant);
    }

    #[test]
    fn missing_input_defaults_to_empty_object() {
        let mut call = tool_call("t1", "search", ToolCallStatus::Pending, None);
        call.input = None;
        let turns = build_llm_messages(&[tool_use_message(1, "", vec![call])]);
        match &turns[0].content[0] {
            ContentBlock::ToolUse(block) => assert_eq!(block.input, json!({})),
            other => panic!("expected toolUse block, got {other:?}"),
        }
    }

    #[test]
    fn strip_removes_tool_blocks_and_empty_turns() {
        let turns = build_llm_messages(&[
            message(1, Role::User, MessageStatus::Complete, "hi"),
            tool_use_message(
                2,
                "",
                vec![tool_call(
                    "t1",
                    "search",
                    ToolCallStatus::Completed,
                    Some(json!("result")),
                )],
            ),
            message(3, Role::Assistant, MessageStatus::Complete, "done"),
        ]);

        let stripped = strip_tool_blocks(turns);
        assert_eq!(
            stripped,
            vec![
                Turn::text(TurnRole::User, "hi"),
                Turn::text(TurnRole::Assistant, "done"),
            ]
        );
        for turn in &stripped {
            assert!(!turn.content.is_empty());
            assert!(turn.content.iter().all(|b| !b.is_tool_block()));
        }
    }

    #[test]
    fn strip_remerges_turns_left_adjacent() {
        // assistant text, tool-only user turn, assistant text: stripping the
        // tool turn leaves assistant,assistant which must merge.
        let turns = vec![
            Turn::text(TurnRole::Assistant, "before"),
            Turn::new(
                TurnRole::User,
                vec![ContentBlock::ToolResult(ToolResultBlock {
                    tool_use_id: "t1".to_string(),
                    content: vec![ToolResultContent {
                        text: "result".to_string(),
                    }],
                    status: "success".to_string(),
                })],
            ),
            Turn::text(TurnRole::Assistant, "after"),
        ];
        let stripped = strip_tool_blocks(turns);
        assert_eq!(
            stripped,
            vec![Turn::new(
                TurnRole::Assistant,
                vec![
                    ContentBlock::Text("before".to_string()),
                    ContentBlock::Text("after".to_string()),
                ]
            )]
        );
    }

    #[test]
    fn assistant_text_with_tool_stop_reason_keeps_leading_text() {
        let turns = build_llm_messages(&[tool_use_message(
            1,
            "let me check",
            vec![tool_call("t1", "search", ToolCallStatus::Completed, None)],
        )]);
        assert_eq!(
            turns[0].content[0],
            ContentBlock::Text("let me check".to_string())
        );
        assert!(matches!(turns[0].content[1], ContentBlock::ToolUse(_)));
        // Absent output formats as an empty string.
        match &turns[1].content[0] {
            ContentBlock::ToolResult(block) => assert_eq!(block.content[0].text, ""),
            other => panic!("expected toolResult block, got {other:?}"),
        }
    }
}
