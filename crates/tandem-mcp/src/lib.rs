// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
//!
//! `tandem-mcp` — MCP (Model Context Protocol) client for tandem.
//!
//! Connects to external MCP servers over **stdio** transport and exposes
//! their tools as [`tandem_tools::ToolExecutor`]s, ready to register in a
//! [`tandem_tools::ToolRegistry`] for the review loop.
//!
//! # Quick start
//!
//! ```no_run
//! # use tandem_mcp::{McpClient, StdioServerParams};
//! # use tandem_tools::ToolRegistry;
//! # async fn demo() -> Result<(), tandem_mcp::McpError> {
//! let client = McpClient::stdio(StdioServerParams {
//!     command: "npx".into(),
//!     args: vec!["-y".into(), "@modelcontextprotocol/server-filesystem".into(), "/".into()],
//!     env: Default::default(),
//! });
//! client.connect().await?;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register_all(client.get_executors());
//! // ... run queries ...
//! client.close().await;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//!
//! ```text
//! Scaffold / tool loop
//!       │  executor call (channel + oneshot reply, 60 s timeout)
//!       ▼
//! worker task  ──►  rmcp session  ──►  subprocess (stdio JSON-RPC)
//! ```
//!
//! The worker task exclusively owns the rmcp session: it performs the
//! initialize handshake, snapshots the tool list once, serves executor
//! requests, and tears the session down when `close()` is signalled.
//! Multiple clients can contribute executors to one registry; name
//! collisions are logged there and the last registration wins.

pub mod client;
pub mod convert;

pub use client::{McpClient, McpError, SessionState, StdioServerParams};
pub use convert::{call_result_to_string, mcp_tool_to_schema};
