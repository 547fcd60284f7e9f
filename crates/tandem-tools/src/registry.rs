// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use crate::ToolExecutor;

/// A tool schema – mirrors tandem_model::ToolSchema but keeps this crate
/// independent from the model crate.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Central registry holding all executors available to the tool loop.
///
/// Registration is name-keyed; registering a second executor under an
/// existing name replaces the first (last registration wins) and logs the
/// collision.  That is the merge policy when several tool sources, e.g.
/// multiple MCP clients, contribute executors.
#[derive(Default)]
pub struct ToolRegistry {
    executors: HashMap<String, Arc<dyn ToolExecutor>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { executors: HashMap::new() }
    }

    pub fn register(&mut self, executor: impl ToolExecutor + 'static) {
        self.register_arc(Arc::new(executor));
    }

    pub fn register_arc(&mut self, executor: Arc<dyn ToolExecutor>) {
        let name = executor.name().to_string();
        if self.executors.insert(name.clone(), executor).is_some() {
            warn!("tool '{name}' registered twice; keeping the last registration");
        }
    }

    /// Register every executor in `executors`, in order.
    pub fn register_all(&mut self, executors: Vec<Arc<dyn ToolExecutor>>) {
        for e in executors {
            self.register_arc(e);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn ToolExecutor>> {
        self.executors.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    /// Produce schemas for all registered executors, sorted by name.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .executors
            .values()
            .map(|e| ToolSchema {
                name: e.name().to_string(),
                description: e.description().to_string(),
                parameters: e.parameters_schema(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Dispatch a tool call by name.
    ///
    /// Unknown names are reported as a result string, not an error: tool
    /// failure is information for the model, never a loop failure.  The
    /// executor runs on its own task so that a panicking executor is also
    /// converted into an error string instead of unwinding into the caller.
    pub async fn execute(&self, name: &str, arguments: &str) -> String {
        match self.executors.get(name) {
            Some(executor) => {
                let executor = Arc::clone(executor);
                let args = arguments.to_string();
                match tokio::spawn(async move { executor.execute(&args).await }).await {
                    Ok(result) => result,
                    Err(e) => format!("Error executing tool '{name}': {e}"),
                }
            }
            None => format!("Error: unknown tool '{name}'."),
        }
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.executors.keys().cloned().collect();
        names.sort();
        names
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
