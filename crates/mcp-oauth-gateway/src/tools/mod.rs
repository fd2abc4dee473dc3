//! MCP tool implementations.
//!
//! Each tool:
//! 1. Decodes its arguments from the `tools/call` params
//! 2. Calls the collaborator it fronts (or computes directly)
//! 3. Returns plain text, which the dispatcher wraps as tool content

mod basic;
mod documents;

pub use basic::{AddTool, NowTool};
pub use documents::{ListDocumentsTool, ReadDocumentTool, ReindexDocumentsTool, SearchDocumentsTool};

use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::corpus::DocumentIndex;
use crate::error::ToolResult;

/// Tool execution context.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Time source for time-reporting tools.
    pub clock: Arc<dyn Clock>,
}

impl ToolContext {
    /// Create a new tool context.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Trait for MCP tools.
#[async_trait::async_trait]
pub trait McpTool: Send + Sync {
    /// Tool name (e.g., "search_documents").
    fn name(&self) -> &'static str;

    /// Tool description for the calling agent.
    fn description(&self) -> &'static str;

    /// JSON Schema for input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Execute the tool with given input.
    async fn execute(&self, ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String>;
}

/// Two tools were registered under the same name.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("tool '{0}' is registered twice")]
pub struct DuplicateTool(pub &'static str);

/// Immutable name → tool table built at startup.
pub struct ToolRegistry {
    tools: Vec<Box<dyn McpTool>>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    /// Build a registry, keeping the given order for `tools/list`.
    pub fn new(tools: Vec<Box<dyn McpTool>>) -> Result<Self, DuplicateTool> {
        let mut by_name = HashMap::with_capacity(tools.len());
        for (idx, tool) in tools.iter().enumerate() {
            if by_name.insert(tool.name(), idx).is_some() {
                return Err(DuplicateTool(tool.name()));
            }
        }
        Ok(Self { tools, by_name })
    }

    /// Get tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn McpTool> {
        self.by_name.get(name).map(|&idx| self.tools[idx].as_ref())
    }

    /// Iterate tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn McpTool> {
        self.tools.iter().map(|t| t.as_ref())
    }

    /// Number of registered tools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry has no tools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.tools.iter().map(|t| t.name())).finish()
    }
}

/// Tools that need no collaborator.
#[must_use]
pub fn builtin_tools() -> Vec<Box<dyn McpTool>> {
    vec![Box::new(NowTool), Box::new(AddTool)]
}

/// Tools fronting a document index.
#[must_use]
pub fn document_tools(index: &Arc<dyn DocumentIndex>) -> Vec<Box<dyn McpTool>> {
    vec![
        Box::new(SearchDocumentsTool::new(Arc::clone(index))),
        Box::new(ListDocumentsTool::new(Arc::clone(index))),
        Box::new(ReadDocumentTool::new(Arc::clone(index))),
        Box::new(ReindexDocumentsTool::new(Arc::clone(index))),
    ]
}

/// Register all tools: the built-ins, plus the document tools when an index is given.
pub fn register_all_tools(
    index: Option<Arc<dyn DocumentIndex>>,
) -> Result<ToolRegistry, DuplicateTool> {
    let mut tools = builtin_tools();
    if let Some(ref index) = index {
        tools.extend(document_tools(index));
    }
    ToolRegistry::new(tools)
}
