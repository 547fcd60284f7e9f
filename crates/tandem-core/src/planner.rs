// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use serde::{Deserialize, Serialize};
use tandem_model::{Message, ResponseFormat};
use tracing::{debug, info};

use crate::{
    error::ScaffoldError,
    prompts::{PLANNER_PROMPT, SYNTHESIZER_PROMPT},
    scaffold::Scaffold,
    tool_loop::SamplingParams,
    usage::UsageStats,
    verdict::strip_fence,
};

/// The planner's structured decomposition of a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanOutput {
    pub tasks: Vec<String>,
}

/// Parse raw planner content into a [`PlanOutput`] with 1–6 tasks.
pub(crate) fn parse_plan(content: &str) -> Result<PlanOutput, String> {
    let body = strip_fence(content);
    let plan: PlanOutput =
        serde_json::from_str(&body).map_err(|e| format!("invalid JSON: {e}"))?;
    if plan.tasks.is_empty() || plan.tasks.len() > 6 {
        return Err(format!(
            "tasks must contain 1-6 entries (got {})",
            plan.tasks.len()
        ));
    }
    if plan.tasks.iter().any(|t| t.trim().is_empty()) {
        return Err("every task must be a non-empty string".to_string());
    }
    Ok(plan)
}

impl Scaffold {
    /// Decompose the query into subtasks, solve each with an independent
    /// [`query`](Scaffold::query), and synthesize a final answer.
    ///
    /// Subtasks share nothing: each gets a fresh notes memory and its own
    /// iteration budget.  After the run, [`usage_last`](Scaffold::usage_last)
    /// covers the whole planned run (planner call + every subtask +
    /// synthesizer call).
    pub async fn query_planned(&mut self, messages: &[Message]) -> Result<String, ScaffoldError> {
        if messages.is_empty() {
            return Err(ScaffoldError::ConfigInvalid(
                "query requires at least one message".to_string(),
            ));
        }

        let mut total = UsageStats::default();

        // 1. Plan: one structured call to model A.
        self.usage = UsageStats::default();
        let mut plan_messages = Vec::with_capacity(messages.len() + 1);
        plan_messages.push(Message::system(PLANNER_PROMPT));
        plan_messages.extend_from_slice(messages);

        let params = SamplingParams {
            temperature: self.anneal_temp_a(0),
            top_p: self.config.top_p_a,
            top_k: self.config.top_k_a,
            reasoning_effort: self.config.reasoning_effort_a.clone(),
        };

        info!("planning → model A ({})", self.config.model_a);
        let completion = self
            .run_tool_loop(
                self.config.model_a.clone(),
                &plan_messages,
                params,
                Some(ResponseFormat::JsonObject),
            )
            .await
            .map_err(|source| ScaffoldError::Provider { step: "planner".into(), source })?;
        if completion.content.trim().is_empty() {
            return Err(ScaffoldError::EmptyCompletion { step: "planner".into() });
        }
        let plan = parse_plan(&completion.content).map_err(|reason| ScaffoldError::PlanParse {
            reason,
            raw: completion.content.clone(),
        })?;
        total.merge(&self.usage);
        info!("plan has {} task(s)", plan.tasks.len());

        // 2. Solve each task independently.
        let mut results: Vec<(String, String)> = Vec::with_capacity(plan.tasks.len());
        for (i, task) in plan.tasks.iter().enumerate() {
            info!("subtask {}/{}", i + 1, plan.tasks.len());
            debug!("subtask: {task}");
            let answer = self.query(&[Message::user(task)]).await?;
            total.merge(&self.usage);
            results.push((task.clone(), answer));
        }

        // 3. Synthesize with model B.
        self.usage = UsageStats::default();
        let mut report = String::from("## Subtask Results\n");
        for (i, (task, answer)) in results.iter().enumerate() {
            report.push_str(&format!("\n### Task {}: {task}\n\n{answer}\n", i + 1));
        }

        let mut synth_messages = Vec::with_capacity(messages.len() + 2);
        synth_messages.push(Message::system(SYNTHESIZER_PROMPT));
        synth_messages.extend_from_slice(messages);
        synth_messages.push(Message::user(report));

        let synth_params = SamplingParams {
            temperature: self.config.temp_b,
            top_p: self.config.top_p_b,
            top_k: self.config.top_k_b,
            reasoning_effort: self.config.reasoning_effort_b.clone(),
        };

        info!("synthesizing → model B ({})", self.config.model_b);
        let completion = self
            .run_tool_loop(self.config.model_b.clone(), &synth_messages, synth_params, None)
            .await
            .map_err(|source| ScaffoldError::Provider { step: "synthesizer".into(), source })?;
        if completion.content.trim().is_empty() {
            return Err(ScaffoldError::EmptyCompletion { step: "synthesizer".into() });
        }

        total.merge(&self.usage);
        self.usage = total;
        info!("usage (planned run): {}", self.usage);
        Ok(completion.content)
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_plan_accepts_valid_task_list() {
        let plan = parse_plan(r#"{"tasks": ["t1", "t2"]}"#).unwrap();
        assert_eq!(plan.tasks, vec!["t1", "t2"]);
    }

    #[test]
    fn parse_plan_accepts_fenced_json() {
        let plan = parse_plan("```json\n{\"tasks\": [\"only\"]}\n```").unwrap();
        assert_eq!(plan.tasks.len(), 1);
    }

    #[test]
    fn parse_plan_rejects_empty_task_list() {
        assert!(parse_plan(r#"{"tasks": []}"#).is_err());
    }

    #[test]
    fn parse_plan_rejects_more_than_six_tasks() {
        let tasks: Vec<String> = (0..7).map(|i| format!("t{i}")).collect();
        let raw = serde_json::json!({ "tasks": tasks }).to_string();
        assert!(parse_plan(&raw).is_err());
    }

    #[test]
    fn parse_plan_rejects_blank_tasks() {
        assert!(parse_plan(r#"{"tasks": ["ok", "  "]}"#).is_err());
    }

    #[test]
    fn parse_plan_rejects_non_json() {
        assert!(parse_plan("first do X, then do Y").is_err());
    }
}
