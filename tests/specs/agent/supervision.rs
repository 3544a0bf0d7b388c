// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Parent/child supervision specs

use crate::prelude::*;
use async_trait::async_trait;
use jido_core::route::RouteSpec;
use jido_runtime::{
    Action, ActionCtx, ActionError, ActionOutcome, AgentModule, AgentSpec, ChildStartOpts,
    Directive, ExitReason, Instance, RouteCtx, StartOptions,
};
use serde_json::Value;
use std::sync::Arc;

struct SpawnWorker;

#[async_trait]
impl Action for SpawnWorker {
    fn name(&self) -> &str {
        "spawn_worker"
    }

    async fn run(&self, _params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        Ok(ActionOutcome::ok().directive(Directive::SpawnAgent {
            agent: AgentSpec::Module(Arc::new(CounterAgent::plain())),
            tag: "worker".to_string(),
            opts: ChildStartOpts::default(),
            meta: Value::Null,
        }))
    }
}

struct Supervisor;

impl AgentModule for Supervisor {
    fn name(&self) -> &str {
        "supervisor"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("spawn", "spawn_worker"),
            RouteSpec::to_action("jido.agent.child.exit", "tick"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![Arc::new(SpawnWorker), Arc::new(TickAction)]
    }
}

#[tokio::test]
async fn terminated_parent_cascades_with_parent_down_shutdown() {
    let instance = Instance::start("spec-sup-cascade").unwrap();
    let (parent, _id) = instance
        .start_agent(StartOptions::module(Arc::new(Supervisor)).id("sup"))
        .unwrap();

    parent.call(signal("spawn")).await.unwrap();
    let child = instance.registry().whereis("sup/worker").unwrap();

    parent.stop(ExitReason::shutdown()).await;
    let reason = child.wait_exit().await;
    assert_eq!(
        reason,
        ExitReason::Shutdown(Some(Box::new(ExitReason::ParentDown(Box::new(
            ExitReason::shutdown()
        )))))
    );
}

#[tokio::test]
async fn child_exit_reaches_parent_as_signal() {
    let instance = Instance::start("spec-sup-child-exit").unwrap();
    let (parent, _id) = instance
        .start_agent(StartOptions::module(Arc::new(Supervisor)).id("sup"))
        .unwrap();

    parent.call(signal("spawn")).await.unwrap();
    let child = instance.registry().whereis("sup/worker").unwrap();
    child.stop(ExitReason::Normal).await;

    eventually(|| parent.state().agent.get("tick_count") == Some(&serde_json::json!(1))).await;
    assert!(parent.state().children.is_empty());
    parent.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn child_is_registered_and_supervised() {
    let instance = Instance::start("spec-sup-registered").unwrap();
    let (parent, _id) = instance
        .start_agent(StartOptions::module(Arc::new(Supervisor)).id("sup"))
        .unwrap();

    parent.call(signal("spawn")).await.unwrap();

    // Registered under the instance registry with the derived id.
    assert!(instance.registry().whereis("sup/worker").is_some());
    // Tracked in the parent's children map.
    assert_eq!(parent.state().children.len(), 1);

    parent.stop(ExitReason::shutdown()).await;
}
