// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use thiserror::Error;

use tandem_model::ProviderError;

/// Errors surfaced by the scaffolding engine.
///
/// Tool-level faults never appear here: the tool loop converts every one of
/// them into an `"Error: ..."` tool message for the model and continues.
/// Everything in this enum propagates to the `query` caller, leaving partial
/// state (notes, iteration counter) in place for inspection or `reset()`.
#[derive(Debug, Error)]
pub enum ScaffoldError {
    /// Construction-time validation failure.  Raised before any model call.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The starter or a reviewer returned empty content.  Not retried.
    #[error("{step}: model returned empty content")]
    EmptyCompletion { step: String },

    /// A reviewer's output did not conform to the structured contract.
    #[error("{step}: could not parse reviewer output ({reason}); raw content:\n{raw}")]
    VerdictParse {
        step: String,
        reason: String,
        raw: String,
    },

    /// The planner's output did not conform to the plan contract.
    #[error("planner: could not parse plan ({reason}); raw content:\n{raw}")]
    PlanParse { reason: String, raw: String },

    /// The provider failed.  `Rejected` is retried once without a response
    /// format on reviewer steps; everything else surfaces directly.
    #[error("{step}: {source}")]
    Provider {
        step: String,
        #[source]
        source: ProviderError,
    },

    /// Snapshot persistence failure (I/O or serialization).
    #[error("checkpoint error: {0}")]
    Checkpoint(String),
}
