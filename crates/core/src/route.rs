// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Routing table mapping signal types to action targets.
//!
//! The router is built once at agent startup and is immutable afterwards.
//! Matching returns every target whose pattern and predicate accept the
//! signal, ordered by priority (descending) then insertion order.

use crate::pattern::{Pattern, PatternError};
use crate::signal::Signal;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("no route matched signal type {signal_type:?}")]
    NoMatch { signal_type: String },
}

/// What a matched route invokes.
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    /// A named action looked up in the agent's action set.
    Action(String),
    /// A nested instruction: a named action with pre-bound params.
    Instruction { action: String, params: serde_json::Value },
}

impl Target {
    pub fn action(name: impl Into<String>) -> Self {
        Target::Action(name.into())
    }

    pub fn instruction(name: impl Into<String>, params: serde_json::Value) -> Self {
        Target::Instruction { action: name.into(), params }
    }

    pub fn action_name(&self) -> &str {
        match self {
            Target::Action(name) => name,
            Target::Instruction { action, .. } => action,
        }
    }

    /// Pre-bound params carried by an instruction target.
    pub fn params(&self) -> Option<&serde_json::Value> {
        match self {
            Target::Action(_) => None,
            Target::Instruction { params, .. } => Some(params),
        }
    }
}

/// Signal predicate attached to a route.
pub type Predicate = Arc<dyn Fn(&Signal) -> bool + Send + Sync>;

/// One route declaration, before priority defaulting.
///
/// Accepts every shape the routing table recognises: bare pattern+target,
/// explicit priority, and an optional predicate.
#[derive(Clone)]
pub struct RouteSpec {
    pub pattern: String,
    pub target: Target,
    pub predicate: Option<Predicate>,
    pub priority: Option<i32>,
}

impl RouteSpec {
    pub fn new(pattern: impl Into<String>, target: Target) -> Self {
        Self { pattern: pattern.into(), target, predicate: None, priority: None }
    }

    /// Shorthand for a pattern routed to a named action.
    pub fn to_action(pattern: impl Into<String>, action: impl Into<String>) -> Self {
        Self::new(pattern, Target::action(action))
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn predicate(
        mut self,
        predicate: impl Fn(&Signal) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Some(Arc::new(predicate));
        self
    }
}

impl std::fmt::Debug for RouteSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteSpec")
            .field("pattern", &self.pattern)
            .field("target", &self.target)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .field("priority", &self.priority)
            .finish()
    }
}

#[derive(Clone)]
struct Route {
    pattern: Pattern,
    target: Target,
    predicate: Option<Predicate>,
    priority: i32,
    seq: usize,
}

/// Immutable, priority-ordered routing table.
#[derive(Clone, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self
            .routes
            .iter()
            .map(|r| format!("{} -> {} (prio {})", r.pattern, r.target.action_name(), r.priority))
            .collect();
        f.debug_struct("Router").field("routes", &entries).finish()
    }
}

impl Router {
    /// Build the table from specs with their already-resolved priorities.
    ///
    /// A later entry with an identical (pattern, priority) pair replaces the
    /// earlier one, taking the later insertion position.
    pub fn build(
        entries: impl IntoIterator<Item = (RouteSpec, i32)>,
    ) -> Result<Self, RouteError> {
        let mut routes: Vec<Route> = Vec::new();
        let mut seq = 0usize;
        for (spec, priority) in entries {
            let priority = spec.priority.unwrap_or(priority);
            let pattern = Pattern::parse(spec.pattern)?;
            routes.retain(|r| !(r.pattern == pattern && r.priority == priority));
            routes.push(Route {
                pattern,
                target: spec.target,
                predicate: spec.predicate,
                priority,
                seq,
            });
            seq += 1;
        }
        Ok(Self { routes })
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Action names referenced by the table, for membership validation.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|r| r.target.action_name())
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// All targets matching the signal, priority-descending then insertion
    /// order. An empty result is a routing error.
    pub fn route(&self, signal: &Signal) -> Result<Vec<Target>, RouteError> {
        let mut matched: Vec<&Route> = self
            .routes
            .iter()
            .filter(|r| r.pattern.matches(&signal.ty) && predicate_accepts(r, signal))
            .collect();
        if matched.is_empty() {
            return Err(RouteError::NoMatch { signal_type: signal.ty.clone() });
        }
        matched.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.seq.cmp(&b.seq)));
        Ok(matched.into_iter().map(|r| r.target.clone()).collect())
    }
}

/// A panicking predicate counts as non-matching rather than taking the
/// server down.
fn predicate_accepts(route: &Route, signal: &Signal) -> bool {
    let Some(pred) = &route.predicate else {
        return true;
    };
    let pred = Arc::clone(pred);
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pred(signal))).unwrap_or_else(|_| {
        tracing::warn!(
            pattern = %route.pattern,
            signal_type = %signal.ty,
            "route predicate panicked; treating as non-match"
        );
        false
    })
}

#[cfg(test)]
#[path = "route_tests.rs"]
mod tests;
