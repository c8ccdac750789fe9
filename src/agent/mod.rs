//! Tool-calling generation: the generator loop, the tool registry, and
//! the retrieval tools themselves.

mod generator;
mod registry;
mod tools;

pub use generator::{Generator, MAX_TOOL_ROUNDS};
pub use registry::ToolRegistry;
pub use tools::{CourseOutlineTool, CourseSearchTool, SourceRecord, Tool};
