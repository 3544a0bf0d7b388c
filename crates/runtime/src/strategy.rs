// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Strategies: policy modules that contribute routes and compute scheduler
//! snapshots for status reporting.

use crate::agent::{AgentValue, RouteCtx};
use crate::directive::Directive;
use jido_core::route::RouteSpec;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scheduler-computed phase of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Idle,
    Running,
    Waiting,
    Success,
    Failure,
}

/// Strategy-produced status snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub status: RunPhase,
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl StatusSnapshot {
    pub fn idle() -> Self {
        Self { status: RunPhase::Idle, done: false, result: None, details: Value::Null }
    }
}

/// What a strategy sees when computing a snapshot.
#[derive(Debug, Clone)]
pub struct StrategyView {
    pub agent: AgentValue,
    pub processing: bool,
    pub queue_len: usize,
    pub error_count: u64,
    pub shutting_down: bool,
}

/// Policy module hooked into startup and status computation.
pub trait Strategy: Send + Sync {
    /// Routes contributed at the strategy layer (default priority 50).
    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        Vec::new()
    }

    /// Directives to run once at post-init.
    fn init(&self, _ctx: &RouteCtx) -> Vec<Directive> {
        Vec::new()
    }

    fn snapshot(&self, view: &StrategyView) -> StatusSnapshot;
}

/// Default snapshot semantics for agents without a strategy module:
/// `done` and `result` come from the conventional `done`/`result`/`failed`
/// state keys; the phase follows queue and processing activity.
#[derive(Default)]
pub struct DefaultStrategy;

impl Strategy for DefaultStrategy {
    fn snapshot(&self, view: &StrategyView) -> StatusSnapshot {
        let done = view
            .agent
            .get("done")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let failed = view
            .agent
            .get("failed")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let status = if done {
            if failed {
                RunPhase::Failure
            } else {
                RunPhase::Success
            }
        } else if view.processing {
            RunPhase::Running
        } else if view.queue_len > 0 {
            RunPhase::Waiting
        } else {
            RunPhase::Idle
        };
        StatusSnapshot {
            status,
            done,
            result: view.agent.get("result").cloned(),
            details: Value::Null,
        }
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
