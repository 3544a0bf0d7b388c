// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Parent/child supervision: spawn, child exit delivery, parent death
//! behaviours, stop-child semantics.

use super::*;
use crate::agent::AgentModule;
use crate::children::{ChildTag, ExitReason, OnParentDeath};
use crate::directive::{AgentSpec, ChildStartOpts};
use crate::instance::Instance;
use serde_json::json;

/// Parent module: `spawn` starts a child counter agent, `stop.child` stops
/// it, `tick` counts child-exit deliveries.
struct ParentModule;

impl AgentModule for ParentModule {
    fn name(&self) -> &str {
        "parent"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("spawn", "spawn_child"),
            RouteSpec::to_action("stop.child", "stop_child"),
            RouteSpec::to_action("jido.agent.child.exit", "tick"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![
            Arc::new(TickAction),
            Arc::new(EmitDirectives {
                name: "spawn_child",
                make: |_ctx| {
                    vec![Directive::SpawnAgent {
                        agent: AgentSpec::Module(Arc::new(CounterModule)),
                        tag: "worker".to_string(),
                        opts: ChildStartOpts::default(),
                        meta: Value::Null,
                    }]
                },
            }),
            Arc::new(EmitDirectives {
                name: "stop_child",
                make: |_ctx| {
                    vec![Directive::StopChild {
                        tag: ChildTag::named("worker"),
                        reason: ExitReason::shutdown(),
                    }]
                },
            }),
        ]
    }
}

async fn start_pair(instance_name: &str) -> (Instance, AgentHandle, AgentHandle) {
    let instance = Instance::start(instance_name).unwrap();
    let (parent, _id) = instance
        .start_agent(StartOptions::module(Arc::new(ParentModule)).id("parent"))
        .unwrap();
    parent.call(signal("spawn")).await.unwrap();

    let child = instance.registry().whereis("parent/worker").unwrap();
    (instance, parent, child)
}

#[tokio::test]
async fn spawn_agent_registers_child_with_derived_id() {
    let (_instance, parent, child) = start_pair("spawn-derived-id").await;

    assert_eq!(child.id(), "parent/worker");
    assert_eq!(child.module_name(), "counter");
    let children = parent.state().children;
    assert_eq!(children, vec![ChildTag::named("worker")]);
    assert_eq!(child.state().parent_id, Some("parent".to_string()));

    parent.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn parent_shutdown_cascades_to_child() {
    let (_instance, parent, child) = start_pair("cascade-shutdown").await;

    parent.stop(ExitReason::shutdown()).await;
    let reason = child.wait_exit().await;
    // Benign parent death wraps as a graceful shutdown.
    assert_eq!(
        reason,
        ExitReason::Shutdown(Some(Box::new(ExitReason::ParentDown(Box::new(
            ExitReason::shutdown()
        )))))
    );
}

#[tokio::test]
async fn parent_killed_gives_abrupt_child_exit() {
    // Start the child directly with a parent ref whose exit we control, so
    // the abrupt-death path is observable without real supervision races.
    let (exit_tx, exit_rx) = tokio::sync::watch::channel(None);
    let parent_ref = crate::children::ParentRef::new("p1", "worker", exit_rx);

    let child = crate::server::start(
        counter_options().id("killed-child").parent(parent_ref),
    )
    .unwrap();

    exit_tx.send(Some(ExitReason::Killed)).unwrap();
    let reason = child.wait_exit().await;
    assert_eq!(reason, ExitReason::ParentDown(Box::new(ExitReason::Killed)));
}

#[tokio::test]
async fn benign_parent_death_gives_shutdown_wrapped_exit() {
    let (exit_tx, exit_rx) = tokio::sync::watch::channel(None);
    let parent_ref = crate::children::ParentRef::new("p1", "worker", exit_rx);

    let child = crate::server::start(
        counter_options().id("benign-child").parent(parent_ref),
    )
    .unwrap();

    exit_tx.send(Some(ExitReason::shutdown())).unwrap();
    let reason = child.wait_exit().await;
    assert_eq!(
        reason,
        ExitReason::Shutdown(Some(Box::new(ExitReason::ParentDown(Box::new(
            ExitReason::shutdown()
        )))))
    );
}

#[tokio::test]
async fn on_parent_death_continue_clears_parent() {
    let (exit_tx, exit_rx) = tokio::sync::watch::channel(None);
    let parent_ref = crate::children::ParentRef::new("p1", "worker", exit_rx);

    let child = crate::server::start(
        counter_options()
            .id("continue-child")
            .parent(parent_ref)
            .on_parent_death(OnParentDeath::Continue),
    )
    .unwrap();

    exit_tx.send(Some(ExitReason::Killed)).unwrap();
    eventually(|| child.state().parent_id.is_none()).await;
    assert!(child.alive());
    child.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn on_parent_death_emit_orphan_delivers_signal() {
    struct OrphanModule;

    impl AgentModule for OrphanModule {
        fn name(&self) -> &str {
            "orphan"
        }

        fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
            vec![RouteSpec::to_action("jido.agent.orphaned", "tick")]
        }

        fn actions(&self) -> Vec<Arc<dyn Action>> {
            vec![Arc::new(TickAction)]
        }
    }

    let (exit_tx, exit_rx) = tokio::sync::watch::channel(None);
    let parent_ref = crate::children::ParentRef::new("p1", "worker", exit_rx);

    let child = crate::server::start(
        StartOptions::module(Arc::new(OrphanModule))
            .id("orphan-child")
            .parent(parent_ref)
            .on_parent_death(OnParentDeath::EmitOrphan),
    )
    .unwrap();

    exit_tx.send(Some(ExitReason::Killed)).unwrap();
    eventually(|| child.state().agent.get("tick_count") == Some(&json!(1))).await;
    assert!(child.alive());
    child.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn child_exit_signal_delivered_and_entry_removed() {
    let (_instance, parent, child) = start_pair("child-exit-delivery").await;

    child.stop(ExitReason::Normal).await;

    // Parent receives jido.agent.child.exit and drops the entry.
    eventually(|| parent.state().agent.get("tick_count") == Some(&json!(1))).await;
    assert!(parent.state().children.is_empty());
    parent.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn stop_child_terminates_and_drops_entry() {
    let (_instance, parent, child) = start_pair("stop-child").await;

    parent.call(signal("stop.child")).await.unwrap();
    eventually(|| !child.alive()).await;
    assert!(parent.state().children.is_empty());
    // An explicit stop delivers no child-exit signal.
    assert_eq!(parent.state().agent.get("tick_count"), None);
    parent.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn stopping_unknown_child_is_noop() {
    let instance = Instance::start("stop-unknown-child").unwrap();
    let (parent, _id) = instance
        .start_agent(StartOptions::module(Arc::new(ParentModule)).id("parent"))
        .unwrap();

    parent.call(signal("stop.child")).await.unwrap();
    assert!(parent.alive());
    parent.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn spawn_without_supervisor_surfaces_spawn_error() {
    // No instance, no spawn_fun: the spawn seam must fail explicitly and the
    // failure flows through the error policy as a fault.
    let handle = crate::server::start(
        StartOptions::module(Arc::new(ParentModule)).id("lone-parent"),
    )
    .unwrap();

    handle.call(signal("spawn")).await.unwrap();
    eventually(|| handle.state().error_count >= 1).await;
    assert!(handle.state().children.is_empty());
    handle.stop(ExitReason::shutdown()).await;
}
