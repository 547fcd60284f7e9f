// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: Apache-2.0
use async_trait::async_trait;
use thiserror::Error;

use crate::{Completion, CompletionRequest};

/// Failure modes of a completion provider.
///
/// `Rejected` covers requests the provider refused outright, typically a
/// parameter combination it does not support, such as a JSON response format
/// together with tool schemas.  Callers may retry a rejected request with a
/// different shape.  `Transport` covers network failures, timeouts, and
/// unparseable upstream responses; callers must not assume the request was
/// never executed.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait Completer: Send + Sync {
    /// Human-readable provider name for log lines.
    fn name(&self) -> &str;

    /// Execute a single chat-completion call.
    ///
    /// The call is strictly request/response: streaming is a presentation
    /// concern and is not part of this contract.
    async fn complete(&self, req: CompletionRequest) -> Result<Completion, ProviderError>;

    /// Estimated cost of a completion in USD.
    ///
    /// Returns `None` when the provider cannot price the completion; cost
    /// accounting treats that as "no charge" and moves on.
    fn estimate_cost(&self, _completion: &Completion) -> Option<f64> {
        None
    }
}
