//! Collaborator-free tools.

use serde_json::json;

use super::{McpTool, ToolContext};
use crate::error::{ToolError, ToolResult};
use crate::models::AddInput;

/// Current date and time.
pub struct NowTool;

#[async_trait::async_trait]
impl McpTool for NowTool {
    fn name(&self) -> &'static str {
        "now"
    }

    fn description(&self) -> &'static str {
        "Get current date and time in ISO 8601 format"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        })
    }

    async fn execute(&self, ctx: &ToolContext, _input: serde_json::Value) -> ToolResult<String> {
        Ok(ctx.clock.now().with_timezone(&chrono::Local).to_rfc3339())
    }
}

/// Integer addition.
pub struct AddTool;

#[async_trait::async_trait]
impl McpTool for AddTool {
    fn name(&self) -> &'static str {
        "add"
    }

    fn description(&self) -> &'static str {
        "Add two integers together"
    }

    fn input_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "a": {"type": "integer", "description": "First number"},
                "b": {"type": "integer", "description": "Second number"}
            },
            "required": ["a", "b"],
            "additionalProperties": false
        })
    }

    async fn execute(&self, _ctx: &ToolContext, input: serde_json::Value) -> ToolResult<String> {
        let params: AddInput = serde_json::from_value(input)?;
        params
            .a
            .checked_add(params.b)
            .map(|sum| sum.to_string())
            .ok_or_else(|| ToolError::validation("b", "sum overflows a 64-bit integer"))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;

    #[tokio::test]
    async fn test_add() {
        let ctx = ToolContext::default();
        assert_eq!(AddTool.execute(&ctx, json!({"a": 2, "b": 3})).await.unwrap(), "5");
        assert_eq!(AddTool.execute(&ctx, json!({"a": -4})).await.unwrap(), "-4");
    }

    #[tokio::test]
    async fn test_add_overflow_is_tool_error() {
        let ctx = ToolContext::default();
        let err = AddTool.execute(&ctx, json!({"a": i64::MAX, "b": 1})).await.unwrap_err();
        assert!(matches!(err, ToolError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_add_bad_arguments() {
        let ctx = ToolContext::default();
        let err = AddTool.execute(&ctx, json!({"a": "x", "b": 1})).await.unwrap_err();
        assert!(matches!(err, ToolError::Arguments(_)));
    }

    #[tokio::test]
    async fn test_now_reports_clock_time() {
        let fixed = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let ctx = ToolContext::new(Arc::new(ManualClock::new(fixed)));

        let text = NowTool.execute(&ctx, json!({})).await.unwrap();
        let parsed = DateTime::parse_from_rfc3339(&text).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), fixed);
    }
}
