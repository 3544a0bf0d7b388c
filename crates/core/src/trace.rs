// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Trace envelope attached to every signal.
//!
//! Generation is pure: a root envelope opens a fresh trace, a child envelope
//! keeps the trace id, opens a new span under the triggering signal's span,
//! and records the triggering signal as its cause.

use crate::id::{SignalId, SpanId, TraceId};
use serde::{Deserialize, Serialize};

/// Causation-preserving trace context carried by a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEnvelope {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<SignalId>,
}

impl TraceEnvelope {
    /// Open a fresh root trace: no parent span, no causation.
    pub fn root() -> Self {
        Self {
            trace_id: TraceId::new(),
            span_id: SpanId::new(),
            parent_span_id: None,
            causation_id: None,
        }
    }

    /// Derive the envelope for work caused by the signal carrying `self`.
    ///
    /// Same trace, new span parented under this one, caused by `causation`.
    pub fn child(&self, causation: SignalId) -> Self {
        Self {
            trace_id: self.trace_id,
            span_id: SpanId::new(),
            parent_span_id: Some(self.span_id),
            causation_id: Some(causation),
        }
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
