// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//!
//! `tandem` — iterative two-model review scaffolding for LLM answers.
//!
//! A query is answered by a high-entropy starter model, then refined by two
//! reviewer models that alternate structured critique-and-rewrite rounds
//! until one accepts the answer or the iteration budget runs out.  Critique
//! hints accumulate in a bounded notes memory with random eviction, and
//! model A's sampling temperature anneals linearly across its review steps.
//! External tools reach the loop through MCP servers bridged by
//! [`McpClient`].
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tandem::{Message, Scaffold, ScaffoldConfig};
//!
//! # async fn demo(provider: Arc<dyn tandem::Completer>) -> Result<(), tandem::ScaffoldError> {
//! // One-shot convenience with default configuration:
//! let answer = tandem::query(provider.clone(), &[Message::user("What is 17 * 23?")]).await?;
//!
//! // Full control via the scaffold:
//! let mut scaffold = Scaffold::new(provider, ScaffoldConfig {
//!     max_iterations: Some(8),
//!     ..Default::default()
//! })?;
//! let answer = scaffold.query(&[Message::user("Explain Gödel's incompleteness theorems.")]).await?;
//! println!("{answer}\n{}", scaffold.usage_last());
//! # Ok(()) }
//! ```

use std::sync::Arc;

pub use tandem_core::{
    prompts, Checkpoint, CheckpointConfig, NotesSnapshot, NotesState, PlanOutput,
    ReviewerVerdict, Scaffold, ScaffoldConfig, ScaffoldError, UsageStats, DEFAULT_MODEL_A,
    DEFAULT_MODEL_B,
};
pub use tandem_mcp::{McpClient, McpError, SessionState, StdioServerParams};
pub use tandem_model::{
    Completer, Completion, CompletionRequest, Message, MessageContent, ProviderError,
    ResponseFormat, Role, ScriptedCompleter, ScriptedResponse, ToolCall, Usage,
};
pub use tandem_tools::{FnExecutor, ToolExecutor, ToolRegistry};

/// Execute a query with a default-configured [`Scaffold`].
///
/// Stateless convenience wrapper: for repeated queries, custom models, tool
/// registries, or checkpoint support, build a [`Scaffold`] directly.
pub async fn query(
    completer: Arc<dyn Completer>,
    messages: &[Message],
) -> Result<String, ScaffoldError> {
    let mut scaffold = Scaffold::new(completer, ScaffoldConfig::default())?;
    scaffold.query(messages).await
}
