// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use serde::{Deserialize, Serialize};

use crate::error::ScaffoldError;
use crate::prompts::{REVIEWER_PROMPT, STARTER_PROMPT};

/// Default starter / odd-review model.
pub const DEFAULT_MODEL_A: &str = "openrouter/deepseek/deepseek-v3.2:online";
/// Default even-review model.
pub const DEFAULT_MODEL_B: &str = "openrouter/google/gemini-3-flash-preview";

/// Immutable configuration for one [`crate::Scaffold`] instance.
///
/// Model identifiers are opaque strings forwarded to the [`Completer`]
/// unchanged.  `reviewer_prompt` is a template that must contain the
/// `{notes}` and `{review_input}` placeholders; both are substituted
/// literally before each review call.
///
/// [`Completer`]: tandem_model::Completer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    /// Model used for the starter inference and odd-numbered reviews.
    pub model_a: String,
    /// Model used for even-numbered reviews.
    pub model_b: String,
    /// Maximum number of notes held by the auto-decaying state.
    pub max_state_size: usize,
    /// Hard cap on outer completer calls (starter included).  `None` means
    /// unlimited.  When reached the current answer is returned as-is.
    pub max_iterations: Option<u32>,
    /// Starting temperature for model A; the annealing schedule begins here.
    pub temp_a_start: f32,
    /// Final temperature model A anneals down to.
    pub temp_a_end: f32,
    /// Review steps over which model A's temperature decays linearly.
    /// Defaults to `max_iterations` when unset, otherwise 10.
    pub temp_a_anneal_steps: Option<u32>,
    /// Fixed sampling temperature for model B.
    pub temp_b: f32,
    pub top_p_a: f32,
    pub top_p_b: f32,
    pub top_k_a: Option<u32>,
    pub top_k_b: Option<u32>,
    /// Reasoning effort hints forwarded per model (e.g. `"high"`).
    pub reasoning_effort_a: Option<String>,
    pub reasoning_effort_b: Option<String>,
    /// System prompt for the first inference.
    pub starter_prompt: String,
    /// System prompt template for all review inferences.
    pub reviewer_prompt: String,
    /// Maximum tool-resolution rounds inside a single outer call.
    pub max_tool_iterations: u32,
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            model_a: DEFAULT_MODEL_A.to_string(),
            model_b: DEFAULT_MODEL_B.to_string(),
            max_state_size: 17,
            max_iterations: None,
            temp_a_start: 1.6,
            temp_a_end: 0.2,
            temp_a_anneal_steps: None,
            temp_b: 0.0,
            top_p_a: 0.95,
            top_p_b: 0.2,
            top_k_a: None,
            top_k_b: None,
            reasoning_effort_a: None,
            reasoning_effort_b: None,
            starter_prompt: STARTER_PROMPT.to_string(),
            reviewer_prompt: REVIEWER_PROMPT.to_string(),
            max_tool_iterations: 8,
        }
    }
}

impl ScaffoldConfig {
    /// Validate every construction-time constraint.
    ///
    /// Called by [`crate::Scaffold::new`]; a failing configuration never
    /// reaches a model call.
    pub fn validate(&self) -> Result<(), ScaffoldError> {
        if self.max_state_size == 0 {
            return Err(invalid("max_state_size must be a positive integer"));
        }
        if self.max_iterations == Some(0) {
            return Err(invalid("max_iterations must be a positive integer or None"));
        }
        if !(self.temp_a_start >= 0.0) {
            return Err(invalid("temp_a_start must be non-negative"));
        }
        if !(self.temp_a_end >= 0.0) {
            return Err(invalid("temp_a_end must be non-negative"));
        }
        if self.temp_a_end > self.temp_a_start {
            return Err(invalid("temp_a_end must be <= temp_a_start"));
        }
        if self.temp_a_anneal_steps == Some(0) {
            return Err(invalid("temp_a_anneal_steps must be a positive integer or None"));
        }
        if !(self.temp_b >= 0.0) {
            return Err(invalid("temp_b must be non-negative"));
        }
        if !(self.top_p_a > 0.0 && self.top_p_a <= 1.0) {
            return Err(invalid("top_p_a must be in (0, 1]"));
        }
        if !(self.top_p_b > 0.0 && self.top_p_b <= 1.0) {
            return Err(invalid("top_p_b must be in (0, 1]"));
        }
        if !self.reviewer_prompt.contains("{notes}") {
            return Err(invalid("reviewer_prompt must contain the {notes} placeholder"));
        }
        if !self.reviewer_prompt.contains("{review_input}") {
            return Err(invalid(
                "reviewer_prompt must contain the {review_input} placeholder",
            ));
        }
        if self.max_tool_iterations == 0 {
            return Err(invalid("max_tool_iterations must be a positive integer"));
        }
        Ok(())
    }

    /// Annealing horizon: explicit steps, else `max_iterations`, else 10.
    pub(crate) fn effective_anneal_steps(&self) -> u32 {
        self.temp_a_anneal_steps.or(self.max_iterations).unwrap_or(10)
    }
}

fn invalid(msg: &str) -> ScaffoldError {
    ScaffoldError::ConfigInvalid(msg.to_string())
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
