//! Messages-API data model and the completion client abstraction.
//!
//! The conversation types mirror the Anthropic wire shapes: content blocks
//! tagged by `"type"`, tool results delivered as a user-role batch. The
//! [`Conversation`] type owns the append rules so a malformed message
//! sequence cannot be built by accident.

mod anthropic;

pub use anthropic::AnthropicClient;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Message author role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One content block within a message or completion.
///
/// Unknown block types deserialize to [`ContentBlock::Unknown`] and are
/// ignored by consumers, so new server-side block kinds do not break the
/// loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
    #[serde(other)]
    Unknown,
}

/// Message content: either a plain string or an ordered block sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

/// A single conversation message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

/// The outcome of one tool dispatch, keyed to the `tool_use` block it
/// answers. Content is always a string by the tool contract.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub tool_use_id: String,
    pub content: String,
}

/// Append-only message log for one query.
///
/// A conversation starts with a single user message and grows only in
/// assistant-turn + tool-result-batch pairs, so strict user/assistant
/// alternation holds by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation with the raw query as the opening user message.
    pub fn opening(query: impl Into<String>) -> Self {
        Self {
            messages: vec![Message {
                role: Role::User,
                content: MessageContent::Text(query.into()),
            }],
        }
    }

    /// Append one tool round: the assistant's full completion content,
    /// followed by all tool results batched into a single user message.
    pub fn push_tool_round(&mut self, assistant: Vec<ContentBlock>, outcomes: Vec<ToolOutcome>) {
        self.messages.push(Message {
            role: Role::Assistant,
            content: MessageContent::Blocks(assistant),
        });
        let results = outcomes
            .into_iter()
            .map(|o| ContentBlock::ToolResult {
                tool_use_id: o.tool_use_id,
                content: o.content,
            })
            .collect();
        self.messages.push(Message {
            role: Role::User,
            content: MessageContent::Blocks(results),
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// A tool's call schema, passed verbatim to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: serde_json::Value,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
    ToolUse,
    #[serde(other)]
    Other,
}

/// One completion returned by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Completion {
    pub content: Vec<ContentBlock>,
    pub stop_reason: StopReason,
}

impl Completion {
    /// First text block's string, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Whether the model stopped to request tool calls.
    pub fn requests_tools(&self) -> bool {
        self.stop_reason == StopReason::ToolUse
    }
}

/// A single completion request. Borrows the caller's conversation state;
/// nothing here outlives one round.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub messages: &'a [Message],
    pub tools: Option<&'a [ToolDefinition]>,
}

/// Synchronous (non-streaming) completion service.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_block_tool_use_deserializes() {
        let raw = json!({
            "type": "tool_use",
            "id": "toolu_01",
            "name": "search_course_content",
            "input": {"query": "embeddings"}
        });

        let block: ContentBlock = serde_json::from_value(raw).unwrap();
        match block {
            ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "toolu_01");
                assert_eq!(name, "search_course_content");
                assert_eq!(input["query"], "embeddings");
            }
            other => panic!("expected tool_use, got {:?}", other),
        }
    }

    #[test]
    fn test_content_block_unknown_type_tolerated() {
        let raw = json!({"type": "thinking", "thinking": "hmm"});
        let block: ContentBlock = serde_json::from_value(raw).unwrap();
        assert_eq!(block, ContentBlock::Unknown);
    }

    #[test]
    fn test_tool_result_serializes_with_type_tag() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "toolu_01".to_string(),
            content: "3 results".to_string(),
        };

        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "tool_result");
        assert_eq!(value["tool_use_id"], "toolu_01");
        assert_eq!(value["content"], "3 results");
    }

    #[test]
    fn test_plain_text_message_serializes_as_string() {
        let message = Message {
            role: Role::User,
            content: MessageContent::Text("What is MCP?".to_string()),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["role"], "user");
        assert_eq!(value["content"], "What is MCP?");
    }

    #[test]
    fn test_conversation_alternates_roles() {
        let mut conversation = Conversation::opening("q");
        conversation.push_tool_round(
            vec![ContentBlock::ToolUse {
                id: "call_1".to_string(),
                name: "search_course_content".to_string(),
                input: json!({"query": "q"}),
            }],
            vec![ToolOutcome {
                tool_use_id: "call_1".to_string(),
                content: "result".to_string(),
            }],
        );

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn test_tool_round_batches_results_into_one_user_message() {
        let mut conversation = Conversation::opening("q");
        conversation.push_tool_round(
            vec![],
            vec![
                ToolOutcome {
                    tool_use_id: "call_1".to_string(),
                    content: "a".to_string(),
                },
                ToolOutcome {
                    tool_use_id: "call_2".to_string(),
                    content: "b".to_string(),
                },
            ],
        );

        let last = conversation.messages().last().unwrap();
        assert_eq!(last.role, Role::User);
        match &last.content {
            MessageContent::Blocks(blocks) => {
                assert_eq!(blocks.len(), 2);
                assert!(matches!(
                    &blocks[0],
                    ContentBlock::ToolResult { tool_use_id, .. } if tool_use_id == "call_1"
                ));
            }
            other => panic!("expected blocks, got {:?}", other),
        }
    }

    #[test]
    fn test_completion_first_text_skips_non_text_blocks() {
        let completion = Completion {
            content: vec![
                ContentBlock::ToolUse {
                    id: "call_1".to_string(),
                    name: "t".to_string(),
                    input: json!({}),
                },
                ContentBlock::Text {
                    text: "answer".to_string(),
                },
            ],
            stop_reason: StopReason::ToolUse,
        };

        assert_eq!(completion.first_text(), Some("answer"));
        assert!(completion.requests_tools());
    }

    #[test]
    fn test_stop_reason_unknown_value_tolerated() {
        let completion: Completion = serde_json::from_value(json!({
            "content": [{"type": "text", "text": "hi"}],
            "stop_reason": "pause_turn"
        }))
        .unwrap();

        assert_eq!(completion.stop_reason, StopReason::Other);
        assert!(!completion.requests_tools());
    }
}
