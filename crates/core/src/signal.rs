// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The signal envelope: the only first-class message unit.
//!
//! A signal is immutable once built. `id`, `type`, and `source` are required
//! at construction; the trace envelope is stamped at the server boundary when
//! absent. Equality is by `id` alone.

use crate::dispatch::DispatchHint;
use crate::id::SignalId;
use crate::trace::TraceEnvelope;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signal types reserved by the runtime.
pub mod types {
    /// Delivered to a parent when a tracked child exits.
    pub const CHILD_EXIT: &str = "jido.agent.child.exit";
    /// Delivered to an agent that outlived its parent with
    /// `on_parent_death = emit_orphan`.
    pub const ORPHANED: &str = "jido.agent.orphaned";
    /// Wraps non-signal messages delivered by one-shot timers.
    pub const SCHEDULED: &str = "jido.scheduled";

    /// Synthesised type for a plugin cron schedule route:
    /// `<plugin_key>.__schedule__.<action_snake>`.
    pub fn plugin_schedule(plugin_key: &str, action: &str) -> String {
        format!("{}.__schedule__.{}", plugin_key, snake_case(action))
    }

    fn snake_case(name: &str) -> String {
        let mut out = String::with_capacity(name.len());
        for (i, c) in name.chars().enumerate() {
            if c.is_ascii_uppercase() {
                if i > 0 {
                    out.push('_');
                }
                out.push(c.to_ascii_lowercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

/// Signal construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("signal {0} must not be empty")]
    MissingField(&'static str),
}

/// Immutable message envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub id: SignalId,
    #[serde(rename = "type")]
    pub ty: String,
    pub source: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatch: Option<DispatchHint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceEnvelope>,
}

impl PartialEq for Signal {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Signal {}

impl Signal {
    /// Start building a signal of the given type.
    pub fn builder(ty: impl Into<String>) -> SignalBuilder {
        SignalBuilder {
            id: None,
            ty: ty.into(),
            source: String::new(),
            data: serde_json::Value::Null,
            dispatch: None,
            trace: None,
        }
    }

    /// Replace the trace envelope.
    pub fn with_trace(mut self, trace: TraceEnvelope) -> Self {
        self.trace = Some(trace);
        self
    }

    /// Stamp a fresh root trace if the signal arrived without one.
    pub fn ensure_trace(mut self) -> Self {
        if self.trace.is_none() {
            self.trace = Some(TraceEnvelope::root());
        }
        self
    }

    /// Derive the trace envelope for work this signal causes.
    ///
    /// Falls back to a fresh root (still recording causation) for the rare
    /// signal that bypassed ingress stamping.
    pub fn child_trace(&self) -> TraceEnvelope {
        match &self.trace {
            Some(t) => t.child(self.id),
            None => TraceEnvelope { causation_id: Some(self.id), ..TraceEnvelope::root() },
        }
    }

    /// One-line summary for log output.
    pub fn log_summary(&self) -> String {
        format!("{} {} from {}", self.id.short(12), self.ty, self.source)
    }
}

/// Builder for [`Signal`]; `build` validates required fields.
#[derive(Debug, Clone)]
pub struct SignalBuilder {
    id: Option<SignalId>,
    ty: String,
    source: String,
    data: serde_json::Value,
    dispatch: Option<DispatchHint>,
    trace: Option<TraceEnvelope>,
}

impl SignalBuilder {
    pub fn id(mut self, id: SignalId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }

    pub fn dispatch(mut self, hint: DispatchHint) -> Self {
        self.dispatch = Some(hint);
        self
    }

    pub fn trace(mut self, trace: TraceEnvelope) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn build(self) -> Result<Signal, SignalError> {
        if self.ty.is_empty() {
            return Err(SignalError::MissingField("type"));
        }
        if self.source.is_empty() {
            return Err(SignalError::MissingField("source"));
        }
        let id = self.id.unwrap_or_default();
        if id.is_empty() {
            return Err(SignalError::MissingField("id"));
        }
        Ok(Signal {
            id,
            ty: self.ty,
            source: self.source,
            data: self.data,
            dispatch: self.dispatch,
            trace: self.trace,
        })
    }
}

#[cfg(test)]
#[path = "signal_tests.rs"]
mod tests;
