// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use tandem_model::{
    Completer, Completion, CompletionRequest, Message, ProviderError, ResponseFormat, ToolSchema,
};
use tandem_tools::ToolRegistry;
use tracing::debug;

use crate::usage::UsageStats;

/// Sampling parameters for one outer call (starter or reviewer).
#[derive(Debug, Clone)]
pub(crate) struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: Option<u32>,
    pub reasoning_effort: Option<String>,
}

/// The agentic sub-loop that resolves tool calls inside a single outer call.
///
/// The loop issues at most `max_tool_iterations + 1` completer calls and the
/// last call never offers tools, so a conforming provider cannot keep the
/// loop alive forever.  When the outer call requests a response format, that
/// format is applied only to calls made without tools (some providers reject
/// the combination); if the model finishes in text while the format was
/// deferred, its tool-less reply is kept as an assistant turn and one final
/// structured completion is requested.
///
/// The caller's message list is never mutated: all tool-resolution turns are
/// appended to a local copy.
pub(crate) struct ToolLoop<'a> {
    pub completer: &'a dyn Completer,
    pub registry: &'a ToolRegistry,
    pub usage: &'a mut UsageStats,
    pub max_tool_iterations: u32,
}

impl ToolLoop<'_> {
    pub async fn run(
        &mut self,
        model: &str,
        messages: &[Message],
        params: &SamplingParams,
        response_format: Option<ResponseFormat>,
    ) -> Result<Completion, ProviderError> {
        let active_tools: Vec<ToolSchema> = self
            .registry
            .schemas()
            .into_iter()
            .map(|s| ToolSchema {
                name: s.name,
                description: s.description,
                parameters: s.parameters,
            })
            .collect();

        let mut local: Vec<Message> = messages.to_vec();

        for iteration in 0..=self.max_tool_iterations {
            let is_last_allowed = iteration >= self.max_tool_iterations;

            // On the last allowed iteration drop tools to force a text reply.
            let current_tools = if is_last_allowed { vec![] } else { active_tools.clone() };
            // Apply response_format only when no tools are offered.
            let current_fmt = if current_tools.is_empty() { response_format } else { None };

            let completion = self
                .call(model, &local, params, current_fmt, current_tools)
                .await?;

            if !completion.has_tool_calls() {
                if current_fmt.is_none() && response_format.is_some() {
                    // The format was deferred; keep the tool-less reply as
                    // context, then request one final structured completion.
                    if !completion.content.trim().is_empty() {
                        local.push(Message::assistant(&completion.content));
                    }
                    return self.call(model, &local, params, response_format, vec![]).await;
                }
                return Ok(completion);
            }

            if is_last_allowed {
                // Tools were not offered on this call; a conforming provider
                // cannot reach here, but guard anyway.
                return Ok(completion);
            }

            let names: Vec<&str> =
                completion.tool_calls.iter().map(|c| c.name.as_str()).collect();
            debug!("tool calls: {}", names.join(", "));

            // Append the assistant turn that carries the calls, then one tool
            // result per call, in dispatch order.
            local.push(Message::assistant_tool_calls(
                completion.content.clone(),
                completion.tool_calls.clone(),
            ));
            for call in &completion.tool_calls {
                let arguments = if call.arguments.is_empty() { "{}" } else { &call.arguments };
                let result = self.registry.execute(&call.name, arguments).await;
                debug!("tool '{}' → {}", call.name, truncate_for_log(&result, 120));
                local.push(Message::tool_result(&call.id, &result));
            }
        }

        unreachable!("the final tool-loop iteration always returns");
    }

    /// One completer call with usage accounting.
    async fn call(
        &mut self,
        model: &str,
        messages: &[Message],
        params: &SamplingParams,
        response_format: Option<ResponseFormat>,
        tools: Vec<ToolSchema>,
    ) -> Result<Completion, ProviderError> {
        let req = CompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: params.temperature,
            top_p: params.top_p,
            top_k: params.top_k,
            reasoning_effort: params.reasoning_effort.clone(),
            response_format,
            tools,
        };
        let completion = self.completer.complete(req).await?;
        self.usage.record(&completion, self.completer.estimate_cost(&completion));
        Ok(completion)
    }
}

/// Cut a log preview at a character boundary.
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let head: String = s.chars().take(max_chars).collect();
    format!("{head}…")
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
