//! Bounded multi-round answer generation.
//!
//! One query gets at most [`MAX_TOOL_ROUNDS`] tool rounds. Each round
//! dispatches every `tool_use` block of the latest completion in order,
//! appends the assistant turn and the batched results to the
//! conversation, then asks the model again with the same parameters.
//! The loop stops early when the model answers in text, when no tools
//! are wired, or when a tool-requesting completion carries no actual
//! calls. Whatever completion the loop ends on is the answer.

use crate::agent::registry::ToolRegistry;
use crate::error::Result;
use crate::llm::{
    Completion, CompletionClient, CompletionRequest, ContentBlock, Conversation, ToolDefinition,
    ToolOutcome,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Upper bound on tool rounds within a single query.
pub const MAX_TOOL_ROUNDS: usize = 2;

/// Returned when the final completion carries no text block.
const FALLBACK_ANSWER: &str =
    "I wasn't able to complete my analysis. Please try rephrasing your question.";

const SYSTEM_PROMPT: &str = r#"You are an AI assistant specialized in course materials and educational content with access to two tools:

1. **search_course_content** — Search within course lesson text for specific topics, concepts, or details.
2. **get_course_outline** — Retrieve a course's title, link, and full lesson list. Use this when asked about what a course covers, its outline, structure, overview, or lesson list.

Tool Usage:
- Use `get_course_outline` for questions about course structure, outlines, overviews, or "what lessons are in" a course
- Use `search_course_content` for questions about specific topics, concepts, or details within course content
- **Up to two tool calls per query** — you may call one tool, review the results, then call a second tool if needed
- Example workflow: use `get_course_outline` to find the course structure, then `search_course_content` to look up details from a specific lesson
- If a tool yields no results, state this clearly without offering alternatives

Response Protocol:
- **General knowledge questions**: Answer using existing knowledge without searching
- **Course outline/overview questions**: Use `get_course_outline`, then present the course title, course link, and complete lesson list (number + title for each)
- **Course content questions**: Use `search_course_content`, then synthesize results into an accurate response
- **Multi-step questions**: If a question requires information from multiple sources (e.g., course structure AND specific content), use tools sequentially to gather all needed information before responding
- **No meta-commentary**:
 - Provide direct answers only — no reasoning process, search explanations, or question-type analysis
 - Do not mention "based on the search results"

All responses must be:
1. **Brief, Concise and focused** - Get to the point quickly
2. **Educational** - Maintain instructional value
3. **Clear** - Use accessible language
4. **Example-supported** - Include relevant examples when they aid understanding
Provide only the direct answer to what was asked.
"#;

/// Drives the tool-calling conversation loop over a completion client.
pub struct Generator {
    client: Arc<dyn CompletionClient>,
}

impl Generator {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    /// Answer `query`, letting the model request tools for up to
    /// [`MAX_TOOL_ROUNDS`] rounds before the latest completion is taken
    /// as the answer.
    ///
    /// Tool dispatch never fails this function: unknown names and tool
    /// errors travel back to the model as tool-result text. Only
    /// completion transport errors surface as `Err`.
    #[instrument(skip(self, conversation_history, tools, registry))]
    pub async fn generate(
        &self,
        query: &str,
        conversation_history: Option<&str>,
        tools: Option<&[ToolDefinition]>,
        registry: Option<&ToolRegistry>,
    ) -> Result<String> {
        let system = match conversation_history {
            Some(history) => format!("{}\n\nPrevious conversation:\n{}", SYSTEM_PROMPT, history),
            None => SYSTEM_PROMPT.to_string(),
        };

        let mut conversation = Conversation::opening(query);

        let mut completion = self
            .client
            .complete(CompletionRequest {
                system: &system,
                messages: conversation.messages(),
                tools,
            })
            .await?;

        for round in 1..=MAX_TOOL_ROUNDS {
            if !completion.requests_tools() {
                break;
            }
            let Some(registry) = registry else {
                break;
            };

            let outcomes = dispatch_tool_uses(&completion, registry).await;
            if outcomes.is_empty() {
                break;
            }
            debug!(round, tool_calls = outcomes.len(), "completed tool round");

            conversation.push_tool_round(completion.content, outcomes);

            completion = self
                .client
                .complete(CompletionRequest {
                    system: &system,
                    messages: conversation.messages(),
                    tools,
                })
                .await?;
        }

        Ok(extract_answer(completion))
    }
}

/// Run every `tool_use` block of `completion` through the registry, in
/// the order the model emitted them.
async fn dispatch_tool_uses(completion: &Completion, registry: &ToolRegistry) -> Vec<ToolOutcome> {
    let mut outcomes = Vec::new();
    for block in &completion.content {
        if let ContentBlock::ToolUse { id, name, input } = block {
            debug!(tool = %name, "dispatching tool call");
            let content = registry.execute_tool(name, input).await;
            outcomes.push(ToolOutcome {
                tool_use_id: id.clone(),
                content,
            });
        }
    }
    outcomes
}

fn extract_answer(completion: Completion) -> String {
    completion
        .first_text()
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_ANSWER.to_string())
}
