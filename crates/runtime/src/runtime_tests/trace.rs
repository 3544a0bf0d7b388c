// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Trace propagation: ingress stamping and causation-preserving child
//! envelopes on directive-produced signals.

use super::*;
use crate::agent::AgentModule;
use crate::children::ExitReason;
use jido_core::dispatch::ChannelDispatcher;
use jido_core::telemetry::{RecordingTelemetry, TelemetryEvent};
use jido_core::trace::TraceEnvelope;

/// `emit` forwards a fresh signal through the default dispatch sink.
struct EmittingModule;

impl AgentModule for EmittingModule {
    fn name(&self) -> &str {
        "emitter"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![RouteSpec::to_action("emit", "emit_one")]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![Arc::new(EmitDirectives {
            name: "emit_one",
            make: |_ctx| {
                vec![Directive::Emit {
                    signal: signal("derived.event"),
                    dispatch: None,
                }]
            },
        })]
    }
}

#[tokio::test]
async fn emitted_signal_carries_child_envelope() {
    let (sink, mut rx) = ChannelDispatcher::pair(8);
    let handle = crate::server::start(
        StartOptions::module(Arc::new(EmittingModule)).default_dispatch(Arc::new(sink)),
    )
    .unwrap();

    let ingress = signal("emit").with_trace(TraceEnvelope::root());
    let ingress_trace = ingress.trace.unwrap();
    let ingress_id = ingress.id;
    handle.call(ingress).await.unwrap();

    let emitted = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .unwrap()
        .unwrap();
    let child = emitted.trace.unwrap();
    assert_eq!(child.trace_id, ingress_trace.trace_id);
    assert_eq!(child.parent_span_id, Some(ingress_trace.span_id));
    assert_eq!(child.causation_id, Some(ingress_id));
    assert_ne!(child.span_id, ingress_trace.span_id);

    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn ingress_without_envelope_gets_fresh_root() {
    let telemetry = RecordingTelemetry::new();
    let handle = crate::server::start(counter_options().telemetry(telemetry.clone())).unwrap();

    handle.call(signal("increment")).await.unwrap();

    let events = telemetry.events();
    let start = events
        .iter()
        .find_map(|e| match e {
            TelemetryEvent::SignalStart { trace, signal_type, .. }
                if signal_type == "increment" =>
            {
                Some(*trace)
            }
            _ => None,
        })
        .unwrap();
    assert!(start.parent_span_id.is_none());
    assert!(start.causation_id.is_none());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn existing_envelope_is_preserved_at_ingress() {
    let telemetry = RecordingTelemetry::new();
    let handle = crate::server::start(counter_options().telemetry(telemetry.clone())).unwrap();

    let env = TraceEnvelope::root();
    handle.call(signal("increment").with_trace(env)).await.unwrap();

    let events = telemetry.events();
    let seen = events.iter().any(|e| match e {
        TelemetryEvent::SignalStart { trace, .. } => trace.trace_id == env.trace_id,
        _ => false,
    });
    assert!(seen, "ingress must preserve the supplied envelope");
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn telemetry_records_signal_lifecycle() {
    let telemetry = RecordingTelemetry::new();
    let handle = crate::server::start(counter_options().telemetry(telemetry.clone())).unwrap();

    handle.call(signal("increment")).await.unwrap();

    let names = telemetry.names();
    assert!(names.contains(&"signal.start"));
    assert!(names.contains(&"signal.stop"));
    handle.stop(ExitReason::shutdown()).await;
}
