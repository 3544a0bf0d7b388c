// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Shared fixtures for the workspace specs: a counter agent built purely
//! against the public API.

#![allow(dead_code)]

use async_trait::async_trait;
use jido_core::route::RouteSpec;
use jido_core::signal::Signal;
use jido_runtime::{
    Action, ActionCtx, ActionError, ActionOutcome, AgentModule, PluginInstance, RouteCtx,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub fn signal(ty: &str) -> Signal {
    match Signal::builder(ty).source("jido://spec").build() {
        Ok(s) => s,
        Err(e) => panic!("signal build failed: {e}"),
    }
}

pub fn signal_with(ty: &str, data: Value) -> Signal {
    match Signal::builder(ty).source("jido://spec").data(data).build() {
        Ok(s) => s,
        Err(e) => panic!("signal build failed: {e}"),
    }
}

/// Poll until `check` passes or the deadline expires.
pub async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within deadline");
}

pub struct IncrementAction;

#[async_trait]
impl Action for IncrementAction {
    fn name(&self) -> &str {
        "increment"
    }

    async fn run(&self, params: Value, ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        let amount = params.get("amount").and_then(Value::as_i64).unwrap_or(1);
        let current = ctx.agent.get("counter").and_then(Value::as_i64).unwrap_or(0);
        Ok(ActionOutcome::ok().effect("counter", json!(current + amount)))
    }
}

pub struct TickAction;

#[async_trait]
impl Action for TickAction {
    fn name(&self) -> &str {
        "tick"
    }

    async fn run(&self, _params: Value, ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        let current = ctx.agent.get("tick_count").and_then(Value::as_i64).unwrap_or(0);
        Ok(ActionOutcome::ok().effect("tick_count", json!(current + 1)))
    }
}

/// Counter agent with optional plugins attached.
pub struct CounterAgent {
    pub plugins: Vec<PluginInstance>,
}

impl CounterAgent {
    pub fn plain() -> Self {
        Self { plugins: Vec::new() }
    }

    pub fn with_plugins(plugins: Vec<PluginInstance>) -> Self {
        Self { plugins }
    }
}

impl AgentModule for CounterAgent {
    fn name(&self) -> &str {
        "counter"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("increment", "increment"),
            RouteSpec::to_action("counter.increment", "increment"),
            RouteSpec::to_action("other.increment", "increment"),
            RouteSpec::to_action("tick", "tick"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![Arc::new(IncrementAction), Arc::new(TickAction)]
    }

    fn plugins(&self) -> Vec<PluginInstance> {
        self.plugins.clone()
    }
}
