// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::{Completer, Completion, CompletionRequest, ProviderError, ToolCall, Usage};

/// One scripted outcome for a [`ScriptedCompleter`] call.
///
/// `ProviderError` is not `Clone`, so error outcomes are stored as the
/// message they will be raised with.
#[derive(Debug, Clone)]
pub enum ScriptedResponse {
    Ok(Completion),
    Rejected(String),
    Transport(String),
}

impl ScriptedResponse {
    /// A plain text completion with a small fixed usage block.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Ok(Completion {
            content: content.into(),
            tool_calls: vec![],
            usage: Some(Usage { prompt_tokens: 10, completion_tokens: 5 }),
        })
    }

    /// A plain text completion with explicit usage numbers.
    pub fn text_with_usage(content: impl Into<String>, prompt: u64, completion: u64) -> Self {
        Self::Ok(Completion {
            content: content.into(),
            tool_calls: vec![],
            usage: Some(Usage { prompt_tokens: prompt, completion_tokens: completion }),
        })
    }

    /// A completion that requests a single tool call.
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self::Ok(Completion {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: id.into(),
                name: name.into(),
                arguments: arguments.into(),
            }],
            usage: Some(Usage { prompt_tokens: 10, completion_tokens: 5 }),
        })
    }
}

/// A pre-scripted completer for tests.  Each `complete` call pops the next
/// scripted outcome from the front of the queue; when the queue runs dry the
/// fallback completion (if any) is returned for every further call.  All
/// requests are recorded so tests can inspect exactly what was sent.
pub struct ScriptedCompleter {
    queue: Mutex<VecDeque<ScriptedResponse>>,
    /// Returned (cloned) whenever the queue is empty.
    fallback: Option<Completion>,
    requests: Mutex<Vec<CompletionRequest>>,
    cost_per_call: Option<f64>,
}

impl ScriptedCompleter {
    pub fn new(script: Vec<ScriptedResponse>) -> Self {
        Self {
            queue: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            cost_per_call: None,
        }
    }

    /// Completer that answers every call with the same text reply.
    pub fn always_text(reply: impl Into<String>) -> Self {
        let mut this = Self::new(vec![]);
        this.fallback = Some(Completion::text(reply));
        this
    }

    /// After the scripted queue is exhausted, keep returning `completion`.
    pub fn with_fallback(mut self, completion: Completion) -> Self {
        self.fallback = Some(completion);
        self
    }

    /// Report a fixed per-completion cost from `estimate_cost`.
    pub fn with_cost(mut self, usd: f64) -> Self {
        self.cost_per_call = Some(usd);
        self
    }

    /// Every request seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of `complete` calls made so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Completer for ScriptedCompleter {
    fn name(&self) -> &str {
        "scripted-mock"
    }

    async fn complete(&self, req: CompletionRequest) -> Result<Completion, ProviderError> {
        self.requests.lock().unwrap().push(req);

        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(ScriptedResponse::Ok(c)) => Ok(c),
            Some(ScriptedResponse::Rejected(msg)) => Err(ProviderError::Rejected(msg)),
            Some(ScriptedResponse::Transport(msg)) => Err(ProviderError::Transport(msg)),
            None => match &self.fallback {
                Some(c) => Ok(c.clone()),
                None => Err(ProviderError::Transport("script exhausted".into())),
            },
        }
    }

    fn estimate_cost(&self, _completion: &Completion) -> Option<f64> {
        self.cost_per_call
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
