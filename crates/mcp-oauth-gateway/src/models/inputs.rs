//! Input models for MCP tool parameters.

use serde::{Deserialize, Serialize};

use crate::config::defaults;

/// Output format of document search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable Markdown format.
    #[default]
    Markdown,
    /// Machine-readable JSON format.
    Json,
}

impl ResponseFormat {
    /// Check if this is JSON format.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Input for `add`. Missing operands count as zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct AddInput {
    #[serde(default)]
    pub a: i64,
    #[serde(default)]
    pub b: i64,
}

/// Input for `search_documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDocumentsInput {
    /// Free-text question or keywords.
    pub query: String,

    /// Number of passages to return.
    #[serde(default = "default_top_k", alias = "topK")]
    pub top_k: usize,

    /// Output format.
    #[serde(default, alias = "responseFormat")]
    pub response_format: ResponseFormat,
}

fn default_top_k() -> usize {
    defaults::SEARCH_TOP_K
}

/// Input for `read_document`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadDocumentInput {
    /// Document name as listed by `list_documents`.
    pub name: String,
}
