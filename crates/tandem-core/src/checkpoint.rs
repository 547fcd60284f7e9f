// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    config::ScaffoldConfig, error::ScaffoldError, notes::NotesSnapshot, scaffold::Scaffold,
};

/// Persisted scaffolding state.
///
/// `state` and `iteration_count` are authoritative: restoring reproduces the
/// notes order and the iteration counter exactly, which keeps the annealing
/// step index stable across a save/load cycle.  The `config` block is
/// informational: it records what the scaffold was configured as when the
/// checkpoint was written and is cross-checked on load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Checkpoint {
    pub state: NotesSnapshot,
    pub iteration_count: u32,
    pub config: CheckpointConfig,
}

/// The sampling-relevant configuration fields recorded in a checkpoint.
/// Prompt templates are deliberately not persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckpointConfig {
    pub model_a: String,
    pub model_b: String,
    pub max_state_size: usize,
    pub max_iterations: Option<u32>,
    pub temp_a_start: f32,
    pub temp_a_end: f32,
    pub temp_a_anneal_steps: Option<u32>,
    pub temp_b: f32,
    pub top_p_a: f32,
    pub top_p_b: f32,
    pub top_k_a: Option<u32>,
    pub top_k_b: Option<u32>,
    pub reasoning_effort_a: Option<String>,
    pub reasoning_effort_b: Option<String>,
}

impl From<&ScaffoldConfig> for CheckpointConfig {
    fn from(cfg: &ScaffoldConfig) -> Self {
        Self {
            model_a: cfg.model_a.clone(),
            model_b: cfg.model_b.clone(),
            max_state_size: cfg.max_state_size,
            max_iterations: cfg.max_iterations,
            temp_a_start: cfg.temp_a_start,
            temp_a_end: cfg.temp_a_end,
            temp_a_anneal_steps: cfg.temp_a_anneal_steps,
            temp_b: cfg.temp_b,
            top_p_a: cfg.top_p_a,
            top_p_b: cfg.top_p_b,
            top_k_a: cfg.top_k_a,
            top_k_b: cfg.top_k_b,
            reasoning_effort_a: cfg.reasoning_effort_a.clone(),
            reasoning_effort_b: cfg.reasoning_effort_b.clone(),
        }
    }
}

impl Scaffold {
    /// Capture the current scaffolding state.
    pub fn snapshot(&self) -> Checkpoint {
        Checkpoint {
            state: self.notes.snapshot(),
            iteration_count: self.iteration_count,
            config: CheckpointConfig::from(&self.config),
        }
    }

    /// Restore scaffolding state from a checkpoint.
    ///
    /// Notes order and the iteration counter are reproduced exactly.  A
    /// config block that disagrees with the live configuration is logged and
    /// otherwise ignored.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        let live = CheckpointConfig::from(&self.config);
        if checkpoint.config != live {
            warn!(
                "checkpoint was written under a different configuration \
                 (saved model_a={}, live model_a={})",
                checkpoint.config.model_a, live.model_a
            );
        }
        self.notes.restore(checkpoint.state);
        self.iteration_count = checkpoint.iteration_count;
    }

    /// Persist the current scaffolding state to a JSON file.
    pub fn save_checkpoint(&self, path: impl AsRef<Path>) -> Result<(), ScaffoldError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.snapshot())
            .map_err(|e| ScaffoldError::Checkpoint(e.to_string()))?;
        std::fs::write(path, json)
            .map_err(|e| ScaffoldError::Checkpoint(format!("write {}: {e}", path.display())))?;
        debug!("checkpoint saved → {}", path.display());
        Ok(())
    }

    /// Restore scaffolding state from a JSON checkpoint file.
    pub fn load_checkpoint(&mut self, path: impl AsRef<Path>) -> Result<(), ScaffoldError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ScaffoldError::Checkpoint(format!("read {}: {e}", path.display())))?;
        let checkpoint: Checkpoint = serde_json::from_str(&json)
            .map_err(|e| ScaffoldError::Checkpoint(e.to_string()))?;
        self.restore(checkpoint);
        debug!("checkpoint loaded ← {}", path.display());
        Ok(())
    }

    /// Clear runtime state (notes and iteration counter).
    pub fn reset(&mut self) {
        self.notes = self.fresh_notes();
        self.iteration_count = 0;
        debug!("state reset");
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────
