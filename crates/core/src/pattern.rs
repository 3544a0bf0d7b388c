// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Dotted glob patterns for signal routing.
//!
//! Segments are separated by `.`; `*` matches exactly one segment, `**`
//! matches zero or more. Everything else matches literally.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern must not be empty")]
    Empty,
    #[error("pattern {0:?} has an empty segment")]
    EmptySegment(String),
    #[error("pattern {0:?} mixes wildcard and literal text in segment {1:?}")]
    InvalidSegment(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`: exactly one segment.
    One,
    /// `**`: zero or more segments.
    Many,
}

/// A parsed dotted glob. Equality and hashing are by source text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Pattern {
    source: String,
    #[serde(skip)]
    segments: Vec<Segment>,
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Pattern {}

impl std::hash::Hash for Pattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl Pattern {
    pub fn parse(source: impl Into<String>) -> Result<Self, PatternError> {
        let source = source.into();
        if source.is_empty() {
            return Err(PatternError::Empty);
        }
        let mut segments = Vec::new();
        for seg in source.split('.') {
            let parsed = match seg {
                "" => return Err(PatternError::EmptySegment(source.clone())),
                "*" => Segment::One,
                "**" => Segment::Many,
                s if s.contains('*') => {
                    return Err(PatternError::InvalidSegment(source.clone(), s.to_string()));
                }
                s => Segment::Literal(s.to_string()),
            };
            segments.push(parsed);
        }
        Ok(Self { source, segments })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern contains no wildcards.
    pub fn is_literal(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Literal(_)))
    }

    /// Match a dotted signal type against this pattern.
    pub fn matches(&self, ty: &str) -> bool {
        let input: Vec<&str> = ty.split('.').collect();
        match_segments(&self.segments, &input)
    }
}

impl TryFrom<String> for Pattern {
    type Error = PatternError;

    fn try_from(s: String) -> Result<Self, PatternError> {
        Pattern::parse(s)
    }
}

impl From<Pattern> for String {
    fn from(p: Pattern) -> String {
        p.source
    }
}

fn match_segments(pattern: &[Segment], input: &[&str]) -> bool {
    match pattern.split_first() {
        None => input.is_empty(),
        Some((Segment::Many, rest)) => {
            // `**` may consume any number of leading segments, including none.
            (0..=input.len()).any(|skip| match_segments(rest, &input[skip..]))
        }
        Some((Segment::One, rest)) => match input.split_first() {
            Some((_, tail)) => match_segments(rest, tail),
            None => false,
        },
        Some((Segment::Literal(lit), rest)) => match input.split_first() {
            Some((head, tail)) => head == lit && match_segments(rest, tail),
            None => false,
        },
    }
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
