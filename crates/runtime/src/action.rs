// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The action seam: user-supplied work invoked by matched routes.

use crate::agent::AgentValue;
use crate::directive::Directive;
use async_trait::async_trait;
use jido_core::signal::Signal;
use jido_core::trace::TraceEnvelope;
use serde_json::{Map, Value};
use thiserror::Error;

/// Context handed to an action run.
#[derive(Debug, Clone)]
pub struct ActionCtx {
    /// Snapshot of the agent value at invocation time.
    pub agent: AgentValue,
    /// The signal being processed.
    pub signal: Signal,
    /// Trace for work this action causes.
    pub trace: TraceEnvelope,
}

/// Errors returned by an action. Effects of a failed action are never applied.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ActionError {
    #[error("{0}")]
    Failed(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
}

/// Result of a successful action run.
#[derive(Debug, Default)]
pub struct ActionOutcome {
    /// Shallow-merged into the agent state.
    pub effects: Map<String, Value>,
    /// Appended to the mailbox in production order.
    pub directives: Vec<Directive>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn with_effects(effects: Map<String, Value>) -> Self {
        Self { effects, directives: Vec::new() }
    }

    pub fn effect(mut self, key: impl Into<String>, value: Value) -> Self {
        self.effects.insert(key.into(), value);
        self
    }

    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

/// User-supplied work: params + context in, effects + directives out.
#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self, params: Value, ctx: ActionCtx) -> Result<ActionOutcome, ActionError>;
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
