// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use proptest::prelude::*;
use yare::parameterized;

#[parameterized(
    literal_exact = { "counter.increment", "counter.increment", true },
    literal_mismatch = { "counter.increment", "counter.decrement", false },
    literal_shorter = { "counter.increment", "counter", false },
    star_one_segment = { "counter.*", "counter.increment", true },
    star_requires_segment = { "counter.*", "counter", false },
    star_not_two_segments = { "counter.*", "counter.a.b", false },
    star_in_middle = { "a.*.c", "a.b.c", true },
    star_in_middle_mismatch = { "a.*.c", "a.b.d", false },
    doublestar_zero = { "counter.**", "counter", true },
    doublestar_many = { "counter.**", "counter.a.b.c", true },
    doublestar_everything = { "**", "any.thing.at.all", true },
    doublestar_middle = { "a.**.z", "a.b.c.z", true },
    doublestar_middle_zero = { "a.**.z", "a.z", true },
    doublestar_middle_mismatch = { "a.**.z", "a.b.c", false },
    doublestar_then_star = { "**.*", "single", true },
)]
fn pattern_matching(pattern: &str, ty: &str, expected: bool) {
    let p = Pattern::parse(pattern).unwrap();
    assert_eq!(p.matches(ty), expected, "{pattern} vs {ty}");
}

#[parameterized(
    empty = { "" },
    empty_segment = { "a..b" },
    trailing_dot = { "a." },
    partial_wildcard = { "a.b*" },
    triple_star = { "a.***" },
)]
fn invalid_patterns_rejected(source: &str) {
    assert!(Pattern::parse(source).is_err());
}

#[test]
fn is_literal() {
    assert!(Pattern::parse("a.b.c").unwrap().is_literal());
    assert!(!Pattern::parse("a.*.c").unwrap().is_literal());
    assert!(!Pattern::parse("a.**").unwrap().is_literal());
}

#[test]
fn equality_and_hash_by_source() {
    use std::collections::HashSet;
    let a = Pattern::parse("a.*").unwrap();
    let b = Pattern::parse("a.*").unwrap();
    assert_eq!(a, b);
    let mut set = HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
}

#[test]
fn serde_round_trip_and_rejects_invalid() {
    let p = Pattern::parse("a.**.z").unwrap();
    let json = serde_json::to_string(&p).unwrap();
    assert_eq!(json, "\"a.**.z\"");
    let back: Pattern = serde_json::from_str(&json).unwrap();
    assert_eq!(back, p);
    assert!(back.matches("a.middle.z"));

    let bad: Result<Pattern, _> = serde_json::from_str("\"a..b\"");
    assert!(bad.is_err());
}

fn segment_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}"
}

proptest! {
    #[test]
    fn literal_pattern_matches_itself(segs in prop::collection::vec(segment_strategy(), 1..5)) {
        let ty = segs.join(".");
        let p = Pattern::parse(ty.clone()).unwrap();
        prop_assert!(p.matches(&ty));
    }

    #[test]
    fn doublestar_matches_any_type(segs in prop::collection::vec(segment_strategy(), 1..5)) {
        let ty = segs.join(".");
        let p = Pattern::parse("**").unwrap();
        prop_assert!(p.matches(&ty));
    }

    #[test]
    fn star_matches_iff_one_extra_segment(
        prefix in prop::collection::vec(segment_strategy(), 1..3),
        extra in prop::collection::vec(segment_strategy(), 1..3),
    ) {
        let p = Pattern::parse(format!("{}.*", prefix.join("."))).unwrap();
        let mut all = prefix.clone();
        all.extend(extra.clone());
        let ty = all.join(".");
        prop_assert_eq!(p.matches(&ty), extra.len() == 1);
    }
}
