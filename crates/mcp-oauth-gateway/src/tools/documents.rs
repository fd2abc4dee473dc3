//! Document retrieval tools backed by a [`DocumentIndex`].

use std::sync::Arc;

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::corpus::{DocumentIndex, Passage};
use crate::error::{ToolError, ToolResult};
use crate::models::{ReadDocumentInput, SearchDocumentsInput};

/// Upper bound on `top_k`.
const MAX_TOP_K: usize = 20;

/// Passage search over processed documents.
pub struct SearchDocumentsTool {
    index: Arc<dyn DocumentIndex>,
}

impl SearchDocumentsTool {
    #[must_use]
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self { index }
    }
}

#[async_trait::async_trait]
impl McpTool for SearchDocumentsTool {
    fn name(&self) -> &'static str {
        "search_documents"
    }

    fn description(&self) -> &'static str {
        "Search the processed document collection and return the passages \
         most relevant to a question."
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Question or keywords to search for"
                },
                "top_k": {
                    "type": "integer",
                    "default": 4,
                    "minimum": 1,
                    "maximum": MAX_TOP_K,
                    "description": "Number of passages to return"
                },
                "response_format": {
                    "type": "string",
                    "enum": ["markdown", "json"],
                    "default": "markdown"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: SearchDocumentsInput = serde_json::from_value(input)?;

        if params.query.trim().is_empty() {
            return Err(ToolError::validation("query", "cannot be empty"));
        }
        if !(1..=MAX_TOP_K).contains(&params.top_k) {
            return Err(ToolError::validation(
                "top_k",
                format!("must be between 1 and {MAX_TOP_K}"),
            ));
        }

        let passages = self.index.search(&params.query, params.top_k).await?;

        if params.response_format.is_json() {
            return Ok(serde_json::to_string(&json!({
                "query": params.query,
                "passages": passages
            }))?);
        }
        Ok(format_passages(&passages))
    }
}

fn format_passages(passages: &[Passage]) -> String {
    if passages.is_empty() {
        return "No matching passages found.".to_string();
    }
    let mut out = String::new();
    for (i, passage) in passages.iter().enumerate() {
        if i > 0 {
            out.push_str("\n\n");
        }
        out.push_str(&format!("[{}] {}\n{}", i + 1, passage.document, passage.text));
    }
    out
}

/// Lists indexed documents.
pub struct ListDocumentsTool {
    index: Arc<dyn DocumentIndex>,
}

impl ListDocumentsTool {
    #[must_use]
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self { index }
    }
}

#[async_trait::async_trait]
impl McpTool for ListDocumentsTool {
    fn name(&self) -> &'static str {
        "list_documents"
    }

    fn description(&self) -> &'static str {
        "List the processed documents available for search"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let names = self.index.list().await?;
        if names.is_empty() {
            return Ok("No documents indexed.".to_string());
        }
        Ok(names.join("\n"))
    }
}

/// Returns the full text of one document.
pub struct ReadDocumentTool {
    index: Arc<dyn DocumentIndex>,
}

impl ReadDocumentTool {
    #[must_use]
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self { index }
    }
}

#[async_trait::async_trait]
impl McpTool for ReadDocumentTool {
    fn name(&self) -> &'static str {
        "read_document"
    }

    fn description(&self) -> &'static str {
        "Read the full processed text of a document by name"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Document name as returned by list_documents"
                }
            },
            "required": ["name"]
        })
    }

    async fn execute(&self, _ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: ReadDocumentInput = serde_json::from_value(input)?;
        Ok(self.index.read(&params.name).await?)
    }
}

/// Rebuilds the document index.
pub struct ReindexDocumentsTool {
    index: Arc<dyn DocumentIndex>,
}

impl ReindexDocumentsTool {
    #[must_use]
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self { index }
    }
}

#[async_trait::async_trait]
impl McpTool for ReindexDocumentsTool {
    fn name(&self) -> &'static str {
        "reindex_documents"
    }

    fn description(&self) -> &'static str {
        "Rebuild the document index from the processed documents directory"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, _ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        let count = self.index.reindex().await?;
        Ok(format!("Indexed {count} documents"))
    }
}
