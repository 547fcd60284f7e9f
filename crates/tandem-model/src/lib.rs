// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//!
//! `tandem-model` — wire types and the provider seam for the tandem engine.
//!
//! The engine never talks to a provider SDK directly: every chat completion
//! goes through the [`Completer`] trait, a single request/response call that
//! carries messages, sampling parameters, an optional response-format
//! constraint, and optional tool schemas.  A deterministic
//! [`ScriptedCompleter`] ships for tests.

mod completer;
mod mock;
mod types;

pub use completer::{Completer, ProviderError};
pub use mock::{ScriptedCompleter, ScriptedResponse};
pub use types::*;
