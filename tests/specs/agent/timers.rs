// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Timer and cron specs

use crate::prelude::*;
use async_trait::async_trait;
use jido_core::id::CronJobId;
use jido_core::route::RouteSpec;
use jido_runtime::{
    Action, ActionCtx, ActionError, ActionOutcome, AgentModule, Directive, ExitReason, Instance,
    RouteCtx, ScheduleMessage, StartOptions,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

struct ScheduleTick;

#[async_trait]
impl Action for ScheduleTick {
    fn name(&self) -> &str {
        "schedule_tick"
    }

    async fn run(&self, _params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        Ok(ActionOutcome::ok().directive(Directive::Schedule {
            delay: Duration::from_millis(50),
            message: ScheduleMessage::Signal(signal("tick")),
        }))
    }
}

struct RegisterCron;

#[async_trait]
impl Action for RegisterCron {
    fn name(&self) -> &str {
        "register_cron"
    }

    async fn run(&self, _params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        Ok(ActionOutcome::ok().directive(Directive::CronRegister {
            expr: "* * * * * *".to_string(),
            message: ScheduleMessage::Signal(signal("tick")),
            job_id: Some(CronJobId::from_string("crn-spec")),
            timezone: None,
        }))
    }
}

struct CancelCron;

#[async_trait]
impl Action for CancelCron {
    fn name(&self) -> &str {
        "cancel_cron"
    }

    async fn run(&self, _params: Value, _ctx: ActionCtx) -> Result<ActionOutcome, ActionError> {
        Ok(ActionOutcome::ok().directive(Directive::CronCancel {
            job_id: CronJobId::from_string("crn-spec"),
        }))
    }
}

struct TimerAgent;

impl AgentModule for TimerAgent {
    fn name(&self) -> &str {
        "timers"
    }

    fn signal_routes(&self, _ctx: &RouteCtx) -> Vec<RouteSpec> {
        vec![
            RouteSpec::to_action("start", "schedule_tick"),
            RouteSpec::to_action("cron.register", "register_cron"),
            RouteSpec::to_action("cron.cancel", "cancel_cron"),
            RouteSpec::to_action("tick", "tick"),
        ]
    }

    fn actions(&self) -> Vec<Arc<dyn Action>> {
        vec![
            Arc::new(ScheduleTick),
            Arc::new(RegisterCron),
            Arc::new(CancelCron),
            Arc::new(TickAction),
        ]
    }
}

#[tokio::test]
async fn scheduled_tick_fires_once_and_clears_handle() {
    let instance = Instance::start("spec-timer-oneshot").unwrap();
    let (handle, _id) = instance
        .start_agent(StartOptions::module(Arc::new(TimerAgent)).id("t1"))
        .unwrap();

    handle.call(signal("start")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let state = handle.state();
    assert_eq!(state.agent.get("tick_count"), Some(&serde_json::json!(1)));
    assert!(state.scheduled_timers.is_empty());
    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn reregistering_cron_job_id_keeps_map_size() {
    let instance = Instance::start("spec-timer-upsert").unwrap();
    let (handle, _id) = instance
        .start_agent(StartOptions::module(Arc::new(TimerAgent)).id("t2"))
        .unwrap();

    handle.call(signal("cron.register")).await.unwrap();
    handle.call(signal("cron.register")).await.unwrap();
    assert_eq!(handle.state().cron_jobs.len(), 1);

    handle.stop(ExitReason::shutdown()).await;
}

#[tokio::test]
async fn cancelling_unknown_cron_job_is_noop() {
    let instance = Instance::start("spec-timer-cancel-unknown").unwrap();
    let (handle, _id) = instance
        .start_agent(StartOptions::module(Arc::new(TimerAgent)).id("t3"))
        .unwrap();

    handle.call(signal("cron.cancel")).await.unwrap();
    assert!(handle.alive());
    assert!(handle.state().cron_jobs.is_empty());
    handle.stop(ExitReason::shutdown()).await;
}
