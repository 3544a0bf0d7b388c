// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Cron registration, upsert, cancellation, and firing.

use super::*;
use crate::agent::AgentModule;
use crate::children::ExitReason;
use jido_core::id::CronJobId;
use serde_json::json;

struct CronModule;

impl AgentModule for CronModule {
    fn name(&self) -> &str {
        "cronner"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("register", "register"),
            RouteSpec::to_action("register.named", "register_named"),
            RouteSpec::to_action("cancel.named", "cancel_named"),
            RouteSpec::to_action("tick", "tick"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![
            Arc::new(TickAction),
            Arc::new(EmitDirectives {
                name: "register",
                make: |_ctx| {
                    vec![Directive::CronRegister {
                        expr: "* * * * * *".to_string(),
                        message: ScheduleMessage::Signal(signal("tick")),
                        job_id: None,
                        timezone: None,
                    }]
                },
            }),
            Arc::new(EmitDirectives {
                name: "register_named",
                make: |_ctx| {
                    vec![Directive::CronRegister {
                        expr: "* * * * * *".to_string(),
                        message: ScheduleMessage::Signal(signal("tick")),
                        job_id: Some(CronJobId::from_string("crn-fixed")),
                        timezone: None,
                    }]
                },
            }),
            Arc::new(EmitDirectives {
                name: "cancel_named",
                make: |_ctx| {
                    vec![Directive::CronCancel {
                        job_id: CronJobId::from_string("crn-fixed"),
                    }]
                },
            }),
        ]
    }
}

fn start_cron() -> AgentHandle {
    crate::server::start(StartOptions::module(Arc::new(CronModule))).unwrap()
}

#[tokio::test]
async fn cron_job_delivers_signals() {
    let handle = start_cron();
    handle.call(signal("register")).await.unwrap();
    assert_eq!(handle.state().cron_jobs.len(), 1);

    eventually(|| {
        handle.state().agent.get("tick_count").and_then(|v| v.as_i64()).unwrap_or(0) >= 1
    })
    .await;
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn registering_same_job_id_twice_replaces_handle() {
    let handle = start_cron();
    handle.call(signal("register.named")).await.unwrap();
    handle.call(signal("register.named")).await.unwrap();

    let state = handle.state();
    assert_eq!(state.cron_jobs.len(), 1, "upsert must not grow the map");
    assert_eq!(state.cron_jobs[0], CronJobId::from_string("crn-fixed"));
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn cancelling_unknown_job_is_noop() {
    let handle = start_cron();
    handle.call(signal("cancel.named")).await.unwrap();
    assert!(handle.state().cron_jobs.is_empty());
    assert!(handle.alive());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn cancel_drops_registered_job() {
    let handle = start_cron();
    handle.call(signal("register.named")).await.unwrap();
    assert_eq!(handle.state().cron_jobs.len(), 1);

    handle.call(signal("cancel.named")).await.unwrap();
    assert!(handle.state().cron_jobs.is_empty());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn cron_jobs_cancelled_on_terminate() {
    let handle = start_cron();
    handle.call(signal("register")).await.unwrap();
    assert_eq!(handle.state().cron_jobs.len(), 1);

    handle.stop(ExitReason::shutdown()).await;
    assert!(handle.state().cron_jobs.is_empty());
}
