// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;
use serde_json::Value;

/// Trait that every tool callable from the model must implement.
///
/// An executor receives the raw JSON argument string exactly as the model
/// produced it and returns a plain-text result.  Executors never fail out of
/// the loop: any failure (bad arguments, an unavailable backend, a remote
/// error) is reported as a returned string starting with `"Error: "`, which
/// the tool loop forwards to the model as ordinary tool output.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON Schema for the arguments object
    fn parameters_schema(&self) -> Value;
    /// Execute the tool with the raw JSON argument string.
    async fn execute(&self, arguments: &str) -> String;
}

/// Adapter wrapping a plain closure as a [`ToolExecutor`].
///
/// Useful for small local tools and for tests that need a stub executor
/// without a full trait impl.
pub struct FnExecutor {
    name: String,
    description: String,
    parameters: Value,
    f: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl FnExecutor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        f: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl ToolExecutor for FnExecutor {
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn parameters_schema(&self) -> Value {
        self.parameters.clone()
    }
    async fn execute(&self, arguments: &str) -> String {
        (self.f)(arguments)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn fn_executor_forwards_arguments() {
        let exec = FnExecutor::new("echo", "echoes input", json!({"type": "object"}), |args| {
            format!("echo:{args}")
        });
        assert_eq!(exec.name(), "echo");
        assert_eq!(exec.execute(r#"{"x":1}"#).await, r#"echo:{"x":1}"#);
    }

    #[tokio::test]
    async fn fn_executor_exposes_schema() {
        let schema = json!({"type": "object", "properties": {"x": {"type": "number"}}});
        let exec = FnExecutor::new("t", "d", schema.clone(), |_| String::new());
        assert_eq!(exec.parameters_schema(), schema);
    }
}
