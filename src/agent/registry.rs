//! Name-keyed tool dispatch with per-tool source tracking.

use crate::agent::tools::{SourceRecord, Tool};
use crate::error::{PensumError, Result};
use crate::llm::ToolDefinition;
use std::sync::Mutex;
use tracing::warn;

struct RegisteredTool {
    name: String,
    tool: Box<dyn Tool>,
    /// Sources from this tool's most recent execution.
    sources: Mutex<Vec<SourceRecord>>,
}

/// Holds the tools available to one query and the provenance they emit.
///
/// Registration order is significant: definitions and aggregated sources
/// both follow it, so callers see sources in the order tools were wired.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under the name its definition declares.
    pub fn register_tool(&mut self, tool: Box<dyn Tool>) -> Result<()> {
        let name = tool.definition().name;
        if self.tools.iter().any(|entry| entry.name == name) {
            return Err(PensumError::DuplicateTool(name));
        }
        self.tools.push(RegisteredTool {
            name,
            tool,
            sources: Mutex::new(Vec::new()),
        });
        Ok(())
    }

    /// Call schemas for every registered tool, in registration order.
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|entry| entry.tool.definition()).collect()
    }

    /// Dispatch a call by name. Unknown names come back as a description,
    /// not an error, so the model sees what went wrong.
    pub async fn execute_tool(&self, name: &str, args: &serde_json::Value) -> String {
        let Some(entry) = self.tools.iter().find(|entry| entry.name == name) else {
            warn!(tool = name, "model requested an unregistered tool");
            return format!("Tool '{}' not found", name);
        };

        let mut sources = Vec::new();
        let output = entry.tool.execute(args, &mut sources).await;
        *entry.sources.lock().unwrap() = sources;
        output
    }

    /// Sources gathered by the most recent execution of each tool,
    /// concatenated in registration order.
    pub fn get_last_sources(&self) -> Vec<SourceRecord> {
        let mut combined = Vec::new();
        for entry in &self.tools {
            combined.extend(entry.sources.lock().unwrap().iter().cloned());
        }
        combined
    }

    /// Clear every tool's source slot. Call once per query, before any
    /// tool can run.
    pub fn reset_sources(&self) {
        for entry in &self.tools {
            entry.sources.lock().unwrap().clear();
        }
    }
}
