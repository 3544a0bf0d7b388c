// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! One-shot timer scheduling through the Schedule directive.

use super::*;
use crate::agent::AgentModule;
use crate::children::ExitReason;
use serde_json::json;

/// Module whose `start` route schedules a `tick` signal in 50 ms.
struct SchedulerModule;

impl AgentModule for SchedulerModule {
    fn name(&self) -> &str {
        "scheduler"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("start", "schedule_tick"),
            RouteSpec::to_action("tick", "tick"),
            RouteSpec::to_action("jido.scheduled", "tick"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![
            Arc::new(TickAction),
            Arc::new(EmitDirectives {
                name: "schedule_tick",
                make: |_ctx| {
                    vec![Directive::Schedule {
                        delay: Duration::from_millis(50),
                        message: ScheduleMessage::Signal(signal("tick")),
                    }]
                },
            }),
        ]
    }
}

fn start_scheduler() -> AgentHandle {
    crate::server::start(StartOptions::module(Arc::new(SchedulerModule))).unwrap()
}

#[tokio::test]
async fn scheduled_signal_fires_and_handle_is_removed() {
    let handle = start_scheduler();
    handle.call(signal("start")).await.unwrap();

    // Timer armed and registered.
    assert_eq!(handle.state().scheduled_timers.len(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let state = handle.state();
    assert_eq!(state.agent.get("tick_count"), Some(&json!(1)));
    assert!(state.scheduled_timers.is_empty(), "handle must be deleted on fire");
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn non_signal_payload_is_wrapped_in_scheduled_signal() {
    let handle = crate::server::start(StartOptions::module(Arc::new(SchedulerModuleWithPayload)))
        .unwrap();
    handle.call(signal("start")).await.unwrap();

    eventually(|| handle.state().agent.get("tick_count") == Some(&json!(1))).await;
    handle.stop(ExitReason::shutdown()).await;
}

/// Same as `SchedulerModule` but schedules a bare payload; delivery arrives
/// as a `jido.scheduled` signal.
struct SchedulerModuleWithPayload;

impl AgentModule for SchedulerModuleWithPayload {
    fn name(&self) -> &str {
        "scheduler_payload"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("start", "schedule_payload"),
            RouteSpec::to_action("jido.scheduled", "tick"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![
            Arc::new(TickAction),
            Arc::new(EmitDirectives {
                name: "schedule_payload",
                make: |_ctx| {
                    vec![Directive::Schedule {
                        delay: Duration::from_millis(20),
                        message: ScheduleMessage::Payload(json!({"kind": "reminder"})),
                    }]
                },
            }),
        ]
    }
}

#[tokio::test]
async fn timers_cancelled_on_terminate() {
    let handle = start_scheduler();
    handle.call(signal("start")).await.unwrap();
    assert_eq!(handle.state().scheduled_timers.len(), 1);

    handle.stop(ExitReason::shutdown()).await;
    // Post-terminate state holds no timer handles.
    assert!(handle.state().scheduled_timers.is_empty());
}
