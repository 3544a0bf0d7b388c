// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;

#[test]
fn root_has_no_parent_or_cause() {
    let env = TraceEnvelope::root();
    assert!(env.parent_span_id.is_none());
    assert!(env.causation_id.is_none());
}

#[test]
fn roots_are_distinct_traces() {
    let a = TraceEnvelope::root();
    let b = TraceEnvelope::root();
    assert_ne!(a.trace_id, b.trace_id);
    assert_ne!(a.span_id, b.span_id);
}

#[test]
fn child_preserves_trace_and_links_span() {
    let parent = TraceEnvelope::root();
    let cause = SignalId::new();
    let child = parent.child(cause);

    assert_eq!(child.trace_id, parent.trace_id);
    assert_ne!(child.span_id, parent.span_id);
    assert_eq!(child.parent_span_id, Some(parent.span_id));
    assert_eq!(child.causation_id, Some(cause));
}

#[test]
fn grandchild_chains_spans() {
    let root = TraceEnvelope::root();
    let c1 = root.child(SignalId::new());
    let c2 = c1.child(SignalId::new());
    assert_eq!(c2.trace_id, root.trace_id);
    assert_eq!(c2.parent_span_id, Some(c1.span_id));
}

#[test]
fn serde_omits_absent_fields() {
    let env = TraceEnvelope::root();
    let json = serde_json::to_value(&env).unwrap();
    assert!(json.get("parent_span_id").is_none());
    assert!(json.get("causation_id").is_none());

    let back: TraceEnvelope = serde_json::from_value(json).unwrap();
    assert_eq!(back, env);
}
