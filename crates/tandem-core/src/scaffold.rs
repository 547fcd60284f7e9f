// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::sync::Arc;

use tandem_model::{Completer, Message, ProviderError, ResponseFormat};
use tandem_tools::ToolRegistry;
use tracing::{debug, info, warn};

use crate::{
    config::ScaffoldConfig,
    error::ScaffoldError,
    notes::NotesState,
    tool_loop::{SamplingParams, ToolLoop},
    usage::UsageStats,
    verdict::{parse_verdict, ReviewerVerdict},
};

/// The scaffolding controller.
///
/// Owns the notes memory, the iteration counter, and the usage totals for
/// the duration of a [`query`](Scaffold::query).  Exactly one outer completer
/// call is in flight at a time; reviewer alternation is strictly sequential
/// (B, A, B, A, … after the starter).  Cancellation is dropping the `query`
/// future: notes and the iteration counter keep whatever partial state was
/// reached, and [`reset`](Scaffold::reset) clears them.
pub struct Scaffold {
    pub(crate) config: ScaffoldConfig,
    pub(crate) completer: Arc<dyn Completer>,
    pub(crate) tools: Arc<ToolRegistry>,
    pub(crate) notes: NotesState,
    pub(crate) iteration_count: u32,
    pub(crate) usage: UsageStats,
    pub(crate) notes_seed: Option<u64>,
}

impl Scaffold {
    /// Construct a controller without tools.
    pub fn new(
        completer: Arc<dyn Completer>,
        config: ScaffoldConfig,
    ) -> Result<Self, ScaffoldError> {
        Self::with_tools(completer, Arc::new(ToolRegistry::new()), config)
    }

    /// Construct a controller with a tool registry.
    ///
    /// The registry is shared and must be fully populated before the first
    /// query; executors contributed by an MCP client must not outlive that
    /// client's running session.
    pub fn with_tools(
        completer: Arc<dyn Completer>,
        tools: Arc<ToolRegistry>,
        config: ScaffoldConfig,
    ) -> Result<Self, ScaffoldError> {
        config.validate()?;
        let notes = NotesState::new(config.max_state_size);
        Ok(Self {
            config,
            completer,
            tools,
            notes,
            iteration_count: 0,
            usage: UsageStats::default(),
            notes_seed: None,
        })
    }

    /// Seed the notes-eviction RNG for deterministic runs.  The seed is
    /// re-applied at every query (the notes memory is rebuilt per query).
    pub fn with_notes_seed(mut self, seed: u64) -> Self {
        self.notes_seed = Some(seed);
        self.notes = NotesState::with_seed(self.config.max_state_size, seed);
        self
    }

    pub fn config(&self) -> &ScaffoldConfig {
        &self.config
    }

    pub fn notes(&self) -> &NotesState {
        &self.notes
    }

    pub fn iteration_count(&self) -> u32 {
        self.iteration_count
    }

    /// Token usage and estimated cost accumulated during the last
    /// [`query`](Scaffold::query) call.
    pub fn usage_last(&self) -> UsageStats {
        self.usage
    }

    /// Execute a query through the scaffolding.
    ///
    /// `messages` is the real user conversation; only these messages are
    /// visible to the models as history.  All scaffolding steps (starter
    /// prompt, reviewer prompts, tool resolution) happen on local copies.
    ///
    /// Returns the final reviewed answer, or the current answer when the
    /// iteration cap is reached first.
    pub async fn query(&mut self, messages: &[Message]) -> Result<String, ScaffoldError> {
        if messages.is_empty() {
            return Err(ScaffoldError::ConfigInvalid(
                "query requires at least one message".to_string(),
            ));
        }

        // Fresh state for every query.
        self.notes = self.fresh_notes();
        self.iteration_count = 0;
        self.usage = UsageStats::default();

        info!("── starting query ──");

        // Step 1: starter inference with model A.
        let mut current_answer = self.run_starter(messages).await?;
        self.iteration_count += 1;
        debug!("starter done, answer length {} chars", current_answer.len());

        // Reviewer cycle: B, A, B, A, …
        let mut review_step: u32 = 0;
        let mut a_review_count: u32 = 0;

        loop {
            if let Some(max) = self.config.max_iterations {
                if self.iteration_count >= max {
                    info!("iteration limit ({max}) reached, returning current answer");
                    info!("usage: {}", self.usage);
                    return Ok(current_answer);
                }
            }

            // Even steps go to model B, odd steps to model A.
            let is_model_a = review_step % 2 == 1;
            let (model, label, params) = if is_model_a {
                let temp = self.anneal_temp_a(a_review_count);
                debug!("model A temperature (annealed): {temp:.4}");
                (
                    self.config.model_a.clone(),
                    "A",
                    SamplingParams {
                        temperature: temp,
                        top_p: self.config.top_p_a,
                        top_k: self.config.top_k_a,
                        reasoning_effort: self.config.reasoning_effort_a.clone(),
                    },
                )
            } else {
                (
                    self.config.model_b.clone(),
                    "B",
                    SamplingParams {
                        temperature: self.config.temp_b,
                        top_p: self.config.top_p_b,
                        top_k: self.config.top_k_b,
                        reasoning_effort: self.config.reasoning_effort_b.clone(),
                    },
                )
            };
            review_step += 1;

            info!("review #{review_step} → model {label} ({model})");
            let step = format!("reviewer#{review_step}");
            let verdict = self
                .run_reviewer(&step, model, params, messages, &current_answer)
                .await?;
            self.iteration_count += 1;
            if is_model_a {
                a_review_count += 1;
            }

            if verdict.accepted {
                info!("accepted after {} inference(s)", self.iteration_count);
                info!("usage: {}", self.usage);
                return Ok(verdict.output);
            }

            debug!("rejected, adding {} note(s)", verdict.added_notes.len());
            self.notes.add_batch(verdict.added_notes);
            current_answer = verdict.output;
        }
    }

    /// Model A's annealed temperature at the given 0-indexed step.
    ///
    /// Linear schedule from `temp_a_start` down to `temp_a_end` over the
    /// annealing horizon; clamped to `temp_a_end` past it.  Step 0 is the
    /// starter; steps 1.. are model-A reviews.
    pub fn anneal_temp_a(&self, step: u32) -> f32 {
        let horizon = self.config.effective_anneal_steps();
        let t = step.min(horizon) as f32;
        self.config.temp_a_end
            + (self.config.temp_a_start - self.config.temp_a_end) * (1.0 - t / horizon as f32)
    }

    pub(crate) fn fresh_notes(&self) -> NotesState {
        match self.notes_seed {
            Some(seed) => NotesState::with_seed(self.config.max_state_size, seed),
            None => NotesState::new(self.config.max_state_size),
        }
    }

    /// Run one outer call (starter/reviewer/planner) through the tool loop.
    pub(crate) async fn run_tool_loop(
        &mut self,
        model: String,
        messages: &[Message],
        params: SamplingParams,
        response_format: Option<ResponseFormat>,
    ) -> Result<tandem_model::Completion, ProviderError> {
        let mut tool_loop = ToolLoop {
            completer: &*self.completer,
            registry: &self.tools,
            usage: &mut self.usage,
            max_tool_iterations: self.config.max_tool_iterations,
        };
        tool_loop.run(&model, messages, &params, response_format).await
    }

    async fn run_starter(&mut self, user_messages: &[Message]) -> Result<String, ScaffoldError> {
        let mut messages = Vec::with_capacity(user_messages.len() + 1);
        messages.push(Message::system(&self.config.starter_prompt));
        messages.extend_from_slice(user_messages);

        let params = SamplingParams {
            temperature: self.anneal_temp_a(0),
            top_p: self.config.top_p_a,
            top_k: self.config.top_k_a,
            reasoning_effort: self.config.reasoning_effort_a.clone(),
        };

        debug!(model = %self.config.model_a, "starter inference");
        let completion = self
            .run_tool_loop(self.config.model_a.clone(), &messages, params, None)
            .await
            .map_err(|source| ScaffoldError::Provider { step: "starter".into(), source })?;

        if completion.content.trim().is_empty() {
            return Err(ScaffoldError::EmptyCompletion { step: "starter".into() });
        }
        Ok(completion.content)
    }

    async fn run_reviewer(
        &mut self,
        step: &str,
        model: String,
        params: SamplingParams,
        user_messages: &[Message],
        current_answer: &str,
    ) -> Result<ReviewerVerdict, ScaffoldError> {
        let system_prompt = self
            .config
            .reviewer_prompt
            .replace("{notes}", &self.notes.format())
            .replace("{review_input}", current_answer);

        let mut messages = Vec::with_capacity(user_messages.len() + 1);
        messages.push(Message::system(system_prompt));
        messages.extend_from_slice(user_messages);

        // Request JSON output; fall back gracefully if the provider rejects it.
        let completion = match self
            .run_tool_loop(
                model.clone(),
                &messages,
                params.clone(),
                Some(ResponseFormat::JsonObject),
            )
            .await
        {
            Ok(c) => c,
            Err(ProviderError::Rejected(reason)) => {
                warn!("json response format not supported ({reason}), retrying without");
                self.run_tool_loop(model, &messages, params, None)
                    .await
                    .map_err(|source| ScaffoldError::Provider { step: step.into(), source })?
            }
            Err(source) => {
                return Err(ScaffoldError::Provider { step: step.into(), source });
            }
        };

        if completion.content.trim().is_empty() {
            return Err(ScaffoldError::EmptyCompletion { step: step.into() });
        }

        parse_verdict(&completion.content).map_err(|reason| ScaffoldError::VerdictParse {
            step: step.into(),
            reason,
            raw: completion.content,
        })
    }
}
