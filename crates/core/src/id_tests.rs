// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;

#[test]
fn generated_ids_carry_prefix_and_length() {
    let id = SignalId::new();
    assert!(id.as_str().starts_with("sig-"));
    assert_eq!(id.as_str().len(), ID_MAX_LEN);

    assert!(TraceId::new().as_str().starts_with("trc-"));
    assert!(SpanId::new().as_str().starts_with("spn-"));
    assert!(TimerRef::new().as_str().starts_with("tmr-"));
    assert!(CronJobId::new().as_str().starts_with("crn-"));
}

#[test]
fn generated_ids_are_unique() {
    let a = SignalId::new();
    let b = SignalId::new();
    assert_ne!(a, b);
}

#[test]
fn from_string_round_trips() {
    let id = TimerRef::from_string("tmr-fixed");
    assert_eq!(id.as_str(), "tmr-fixed");
    assert_eq!(id.to_string(), "tmr-fixed");
}

#[test]
fn id_serde_is_transparent() {
    let id = CronJobId::from_string("crn-abc");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"crn-abc\"");
    let parsed: CronJobId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn id_equality_with_str() {
    let id = SignalId::from_string("sig-1");
    assert_eq!(id, "sig-1");
    assert_ne!(id, "sig-2");
}

#[test]
fn short_truncates() {
    assert_eq!(short("abcdef", 3), "abc");
    assert_eq!(short("ab", 3), "ab");
    let id = SignalId::from_string("sig-abcdef");
    assert_eq!(id.short(7), "sig-abc");
}

#[test]
fn idbuf_hash_matches_str() {
    use std::collections::HashMap;
    let mut map: HashMap<SignalId, u32> = HashMap::new();
    map.insert(SignalId::from_string("sig-x"), 1);
    // Borrow<str> lookup must hit the same bucket.
    assert_eq!(map.get("sig-x"), Some(&1));
}

#[test]
fn oversized_id_rejected_by_serde() {
    let long = format!("\"{}\"", "x".repeat(ID_MAX_LEN + 1));
    let parsed: Result<SignalId, _> = serde_json::from_str(&long);
    assert!(parsed.is_err());
}

#[test]
fn empty_idbuf() {
    let buf = IdBuf::empty();
    assert!(buf.is_empty());
    assert_eq!(buf.as_str(), "");
}
