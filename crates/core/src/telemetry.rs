// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Telemetry events emitted by the runtime through a thin adapter.
//!
//! The runtime never talks to a tracer directly; it hands structured events
//! to a [`Telemetry`] sink. The default sink forwards to `tracing`.

use crate::trace::TraceEnvelope;
use std::sync::Arc;
use std::time::Duration;

/// Structured runtime event with its measurements and metadata.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    SignalStart {
        system_time_ms: u64,
        agent_id: String,
        agent_module: String,
        signal_type: String,
        trace: TraceEnvelope,
    },
    SignalStop {
        duration: Duration,
        agent_id: String,
        signal_type: String,
        directive_count: usize,
    },
    SignalException {
        duration: Duration,
        agent_id: String,
        signal_type: String,
        kind: String,
        reason: String,
    },
    DirectiveStart {
        system_time_ms: u64,
        agent_id: String,
        directive_type: &'static str,
    },
    DirectiveStop {
        duration: Duration,
        agent_id: String,
        directive_type: &'static str,
    },
    DirectiveException {
        duration: Duration,
        agent_id: String,
        directive_type: &'static str,
        kind: String,
        reason: String,
    },
    QueueOverflow {
        agent_id: String,
        queue_len: usize,
        max_queue_size: usize,
    },
}

impl TelemetryEvent {
    /// Event name for sinks that key on strings.
    pub fn name(&self) -> &'static str {
        match self {
            TelemetryEvent::SignalStart { .. } => "signal.start",
            TelemetryEvent::SignalStop { .. } => "signal.stop",
            TelemetryEvent::SignalException { .. } => "signal.exception",
            TelemetryEvent::DirectiveStart { .. } => "directive.start",
            TelemetryEvent::DirectiveStop { .. } => "directive.stop",
            TelemetryEvent::DirectiveException { .. } => "directive.exception",
            TelemetryEvent::QueueOverflow { .. } => "queue.overflow",
        }
    }
}

/// Telemetry sink.
pub trait Telemetry: Send + Sync {
    fn emit(&self, event: &TelemetryEvent);
}

/// Shared telemetry handle.
pub type TelemetrySink = Arc<dyn Telemetry>;

/// Default sink: structured `tracing` events.
#[derive(Default)]
pub struct TracingTelemetry;

impl Telemetry for TracingTelemetry {
    fn emit(&self, event: &TelemetryEvent) {
        match event {
            TelemetryEvent::SignalStart { agent_id, agent_module, signal_type, trace, .. } => {
                tracing::debug!(
                    agent_id,
                    agent_module,
                    signal_type,
                    trace_id = %trace.trace_id,
                    span_id = %trace.span_id,
                    parent_span_id = trace.parent_span_id.as_ref().map(|s| s.to_string()),
                    causation_id = trace.causation_id.as_ref().map(|s| s.to_string()),
                    "signal.start"
                );
            }
            TelemetryEvent::SignalStop { duration, agent_id, signal_type, directive_count } => {
                tracing::debug!(
                    agent_id,
                    signal_type,
                    duration_us = duration.as_micros() as u64,
                    directive_count,
                    "signal.stop"
                );
            }
            TelemetryEvent::SignalException { duration, agent_id, signal_type, kind, reason } => {
                tracing::warn!(
                    agent_id,
                    signal_type,
                    duration_us = duration.as_micros() as u64,
                    kind,
                    reason,
                    "signal.exception"
                );
            }
            TelemetryEvent::DirectiveStart { agent_id, directive_type, .. } => {
                tracing::trace!(agent_id, directive_type, "directive.start");
            }
            TelemetryEvent::DirectiveStop { duration, agent_id, directive_type } => {
                tracing::trace!(
                    agent_id,
                    directive_type,
                    duration_us = duration.as_micros() as u64,
                    "directive.stop"
                );
            }
            TelemetryEvent::DirectiveException {
                duration,
                agent_id,
                directive_type,
                kind,
                reason,
            } => {
                tracing::warn!(
                    agent_id,
                    directive_type,
                    duration_us = duration.as_micros() as u64,
                    kind,
                    reason,
                    "directive.exception"
                );
            }
            TelemetryEvent::QueueOverflow { agent_id, queue_len, max_queue_size } => {
                tracing::warn!(agent_id, queue_len, max_queue_size, "queue.overflow");
            }
        }
    }
}

/// Records every event for assertions in tests.
#[cfg(any(test, feature = "test-support"))]
pub struct RecordingTelemetry {
    events: parking_lot::Mutex<Vec<TelemetryEvent>>,
}

#[cfg(any(test, feature = "test-support"))]
impl RecordingTelemetry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { events: parking_lot::Mutex::new(Vec::new()) })
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(|e| e.name()).collect()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Telemetry for RecordingTelemetry {
    fn emit(&self, event: &TelemetryEvent) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
