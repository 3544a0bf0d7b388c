// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Scenario tests for the agent server: drain loop, pipeline, directives,
//! supervision, timers.

mod completion;
mod counter;
mod cron;
mod errors;
mod overflow;
mod parent_child;
mod plugins;
mod schedule;
mod trace;

use crate::action::{Action, ActionCtx, ActionError, ActionOutcome};
use crate::agent::{AgentModule, RouteCtx};
use crate::directive::{Directive, ScheduleMessage};
use crate::options::StartOptions;
use crate::server::AgentHandle;
use async_trait::async_trait;
use jido_core::route::RouteSpec;
use jido_core::signal::Signal;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn signal(ty: &str) -> Signal {
    Signal::builder(ty).source("jido://test").build().unwrap()
}

pub(crate) fn signal_with(ty: &str, data: Value) -> Signal {
    Signal::builder(ty).source("jido://test").data(data).build().unwrap()
}

/// Poll until `check` passes or the deadline expires.
pub(crate) async fn eventually(check: impl Fn() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within deadline");
}

/// Adds `params.amount` (default 1) to the `counter` state key.
pub(crate) struct IncrementAction;

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

/// Increments `tick_count`.
pub(crate) struct TickAction;

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

/// Appends `params.mark` to the `seen` list; used for ordering assertions.
pub(crate) struct MarkAction;

#[async_trait]
impl Action for MarkAction {
    fn name(&self) -> &str {
        "mark"
    }

    async fn run(&self, params: Value, ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        let mut seen = ctx
            .agent
            .get("seen")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        seen.push(params.get("mark").cloned().unwrap_or(Value::Null));
        Ok(ActionOutcome::ok().effect("seen", Value::Array(seen)))
    }
}

/// Always fails.
pub(crate) struct FailAction;

#[async_trait]
impl Action for FailAction {
    fn name(&self) -> &str {
        "fail"
    }

    async fn run(&self, _params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        Err(ActionError::Failed("deliberate failure".to_string()))
    }
}

/// Sleeps for `params.ms` to keep the drain pass busy.
pub(crate) struct SlowAction;

#[async_trait]
impl Action for SlowAction {
    fn name(&self) -> &str {
        "slow"
    }

    async fn run(&self, params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        let ms = params.get("ms").and_then(Value::as_u64).unwrap_or(100);
        tokio::time::sleep(Duration::from_millis(ms)).await;
        Ok(ActionOutcome::ok())
    }
}

/// Emits the directives handed over in its params-free constructor.
pub(crate) struct EmitDirectives {
    pub name: &'static str,
    pub make: fn(&ActionCtx) -> Vec<Directive>,
}

#[async_trait]
impl Action for EmitDirectives {
    fn name(&self) -> &str {
        self.name
    }

    async fn run(&self, _params: Value, ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        let mut out = ActionOutcome::ok();
        out.directives = (self.make)(&ctx);
        Ok(out)
    }
}

/// Counter agent: `increment`-family routes plus tick/mark/fail/slow helpers.
pub(crate) struct CounterModule;

impl AgentModule for CounterModule {
    fn name(&self) -> &str {
        "counter"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("increment", "increment"),
            RouteSpec::to_action("counter.increment", "increment"),
            RouteSpec::to_action("other.increment", "increment"),
            RouteSpec::to_action("tick", "tick"),
            RouteSpec::to_action("mark", "mark"),
            RouteSpec::to_action("fail", "fail"),
            RouteSpec::to_action("slow", "slow"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![
            Arc::new(IncrementAction),
            Arc::new(TickAction),
            Arc::new(MarkAction),
            Arc::new(FailAction),
            Arc::new(SlowAction),
        ]
    }
}

pub(crate) fn counter_options() -> StartOptions {
    StartOptions::module(Arc::new(CounterModule))
}

pub(crate) fn start_counter() -> AgentHandle {
    crate::server::start(counter_options()).unwrap()
}
