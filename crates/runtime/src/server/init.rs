// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Post-init: strategy startup directives, plugin children, sensors, cron
//! schedules, and parent monitoring.
//!
//! Each plugin's startup is isolated; a failing child or sensor is logged
//! without affecting other plugins, and the server goes idle regardless.

use super::{mailbox_sink, track_task_child, Control, ServerShared};
use crate::agent::RouteCtx;
use crate::children::{ChildSpec, ChildTag, ExitReason, SpawnResult};
use crate::directive::ScheduleMessage;
use crate::lifecycle::LifecycleEvent;
use crate::plugin::InstalledPlugin;
use crate::scheduler;
use crate::sensor::SENSOR_BUFFER;
use crate::state::QueueEntry;
use jido_core::id::CronJobId;
use jido_core::signal::{types as signal_types, Signal};
use serde_json::Value;
use std::sync::{Arc, Weak};
use tokio::sync::mpsc;

pub(crate) async fn post_init(shared: &Arc<ServerShared>) {
    let agent = shared.state.lock().agent.clone();
    shared.config.lifecycle.init(&agent).await;

    // Strategy init directives run at the head of the first drain pass.
    let ctx = RouteCtx { agent: agent.clone() };
    let directives = shared.config.strategy.init(&ctx);
    if !directives.is_empty() {
        let mut st = shared.state.lock();
        for directive in directives {
            if st.queue.len() >= st.max_queue_size {
                tracing::warn!(agent_id = %shared.config.id, "queue overflow during init");
                break;
            }
            st.queue.push_back(QueueEntry::Directive { directive, batch: None });
        }
    }

    for installed in &shared.config.plugins {
        plugin_post_init(shared, installed);
    }

    watch_parent(shared);

    shared.config.lifecycle.event(LifecycleEvent::PostInit, &agent).await;
}

/// Start one plugin's children, sensors, and cron schedules. Failures are
/// logged and contained.
fn plugin_post_init(shared: &Arc<ServerShared>, installed: &InstalledPlugin) {
    let key = installed.state_key().to_string();
    let plugin = &installed.instance.plugin;

    for spec in plugin.child_specs(&installed.instance.config) {
        let tag = ChildTag::Plugin { plugin: key.clone(), child: spec.id.clone() };
        match (shared.config.spawn_fun)(spec) {
            Ok(SpawnResult::Spawned(task)) => track_task_child(shared, tag, task, Value::Null),
            Ok(SpawnResult::SpawnedWithInfo(task, info)) => {
                track_task_child(shared, tag, task, info);
            }
            Ok(SpawnResult::Ignored) => {}
            Err(e) => {
                tracing::warn!(
                    agent_id = %shared.config.id,
                    plugin = %key,
                    error = %e,
                    "plugin child failed to start"
                );
            }
        }
    }

    for sensor in plugin.sensors() {
        let name = sensor.name().to_string();
        let tag = ChildTag::Sensor { plugin: key.clone(), sensor: name.clone() };
        let (tx, rx) = mpsc::channel(SENSOR_BUFFER);
        let spec = ChildSpec::new(name.clone(), sensor.run(tx));
        match (shared.config.spawn_fun)(spec) {
            Ok(SpawnResult::Spawned(task)) => {
                track_task_child(shared, tag, task, Value::Null);
                forward_sensor(shared, rx);
            }
            Ok(SpawnResult::SpawnedWithInfo(task, info)) => {
                track_task_child(shared, tag, task, info);
                forward_sensor(shared, rx);
            }
            Ok(SpawnResult::Ignored) => {}
            Err(e) => {
                tracing::warn!(
                    agent_id = %shared.config.id,
                    plugin = %key,
                    sensor = %name,
                    error = %e,
                    "sensor failed to start"
                );
            }
        }
    }

    if shared.config.skip_schedules {
        return;
    }
    for schedule in plugin.schedules() {
        let ty = signal_types::plugin_schedule(&key, &schedule.action);
        let signal = match Signal::builder(ty).source(shared.config.source.clone()).build() {
            Ok(signal) => signal,
            Err(e) => {
                tracing::warn!(agent_id = %shared.config.id, plugin = %key, error = %e, "bad schedule signal");
                continue;
            }
        };
        let job = CronJobId::new();
        match scheduler::arm_cron(
            mailbox_sink(shared),
            job,
            &schedule.cron,
            schedule.timezone.as_deref(),
            ScheduleMessage::Signal(signal),
        ) {
            Ok(handle) => {
                shared.state.lock().cron_jobs.insert(job, handle);
            }
            Err(e) => {
                tracing::warn!(
                    agent_id = %shared.config.id,
                    plugin = %key,
                    expr = %schedule.cron,
                    error = %e,
                    "plugin schedule rejected"
                );
            }
        }
    }
}

/// Forward sensor emissions into the owning mailbox until the sensor closes
/// its channel or the server goes away.
fn forward_sensor(shared: &Arc<ServerShared>, mut rx: mpsc::Receiver<Signal>) {
    let weak: Weak<ServerShared> = Arc::downgrade(shared);
    let abort = tokio::spawn(async move {
        while let Some(signal) = rx.recv().await {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            shared.enqueue_internal(signal);
        }
    })
    .abort_handle();
    shared.state.lock().aux_tasks.push(abort);
}

/// Monitor the parent: post a `ParentDown` control message once it exits.
fn watch_parent(shared: &Arc<ServerShared>) {
    let parent = { shared.state.lock().parent.clone() };
    let Some(parent) = parent else {
        return;
    };
    let mut rx = parent.exit.clone();
    let control = shared.control_tx.clone();
    let abort = tokio::spawn(async move {
        loop {
            let current = rx.borrow_and_update().clone();
            if let Some(reason) = current {
                let _ = control.send(Control::ParentDown { reason });
                return;
            }
            if rx.changed().await.is_err() {
                // Parent state dropped without recording an exit.
                let _ = control.send(Control::ParentDown { reason: ExitReason::NoProc });
                return;
            }
        }
    })
    .abort_handle();
    shared.state.lock().aux_tasks.push(abort);
}
