// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//!
//! Type conversions between rmcp's MCP model types and tandem's tool types.
//!
//! These are pure, stateless functions.  They sit at the seam between the
//! wire protocol and the [`tandem_tools`] registry so neither side needs to
//! know about the other.

use rmcp::model::{CallToolResult, Tool as McpTool};
use tandem_tools::ToolSchema;

/// Convert an rmcp [`Tool`](McpTool) descriptor into a registry schema.
///
/// A missing description becomes the empty string; the input schema is
/// passed through as the parameters object without further processing.
pub fn mcp_tool_to_schema(tool: &McpTool) -> ToolSchema {
    ToolSchema {
        name: tool.name.to_string(),
        description: tool.description.as_deref().unwrap_or_default().to_string(),
        parameters: serde_json::Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Flatten a [`CallToolResult`] into the plain-text form the tool loop
/// forwards to the model.
///
/// All text content items are joined with newlines.  A result flagged
/// `is_error` is prefixed with `"Error: "` so the model sees the failure as
/// such; a result with no text items falls back to its JSON serialization.
pub fn call_result_to_string(name: &str, result: &CallToolResult) -> String {
    let text = result
        .content
        .iter()
        .filter_map(|c| c.as_text())
        .map(|t| t.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    if result.is_error == Some(true) {
        if text.is_empty() {
            format!("Error: tool '{name}' reported an error.")
        } else if text.starts_with("Error") {
            text
        } else {
            format!("Error: {text}")
        }
    } else if text.is_empty() {
        serde_json::to_string(result).unwrap_or_default()
    } else {
        text
    }
}

// ─── Unit tests ───────────────────────────────────────────────────────────────
