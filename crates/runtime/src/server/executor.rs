// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Directive executor

use super::{mailbox_sink, track_agent_child, track_task_child, ServerShared};
use crate::children::{ChildTag, ExitReason, SpawnResult};
use crate::directive::{Directive, Fault, FaultContext};
use crate::options::StartOptions;
use crate::policy::{decide, PolicyOutcome};
use crate::scheduler;
use crate::state::QueueEntry;
use jido_core::id::{MonitorRef, TimerRef};
use jido_core::signal::Signal;
use jido_core::telemetry::TelemetryEvent;
use serde_json::{json, Value};
use std::sync::Arc;

/// Signal type emitted by the `emit_signal` error policy.
pub(crate) const AGENT_ERROR_TYPE: &str = "jido.agent.error";

#[derive(Debug, PartialEq)]
pub(crate) enum ExecOutcome {
    Continue,
    Stop(ExitReason),
}

/// Execute a single directive with tracing and telemetry.
///
/// Failures are converted into queued `Error` directives for the policy;
/// they never stop execution here unless the policy says so later.
pub(crate) async fn execute(shared: &Arc<ServerShared>, directive: Directive) -> ExecOutcome {
    let info: String = directive
        .fields()
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
    let op = directive.name();
    let verbose = directive.verbose();
    if verbose {
        tracing::info!(agent_id = %shared.config.id, "executing directive={} {}", op, info);
    } else {
        tracing::debug!(agent_id = %shared.config.id, "executing directive={} {}", op, info);
    }
    shared.telemetry(TelemetryEvent::DirectiveStart {
        system_time_ms: shared.config.clock.epoch_ms(),
        agent_id: shared.config.id.clone(),
        directive_type: op,
    });

    let started = shared.config.clock.now();
    let result = execute_inner(shared, directive).await;
    let duration = shared.config.clock.now().saturating_duration_since(started);

    match result {
        Ok(outcome) => {
            shared.telemetry(TelemetryEvent::DirectiveStop {
                duration,
                agent_id: shared.config.id.clone(),
                directive_type: op,
            });
            outcome
        }
        Err((fault, context)) => {
            shared.telemetry(TelemetryEvent::DirectiveException {
                duration,
                agent_id: shared.config.id.clone(),
                directive_type: op,
                kind: context.to_string(),
                reason: fault.to_string(),
            });
            tracing::error!(
                agent_id = %shared.config.id,
                error = %fault,
                context = %context,
                "directive failed, queueing error"
            );
            let mut st = shared.state.lock();
            if st.queue.len() >= st.max_queue_size {
                tracing::warn!(agent_id = %shared.config.id, "queue overflow, dropping error directive");
            } else {
                st.queue.push_back(QueueEntry::Directive {
                    directive: Directive::Error { error: fault, context },
                    batch: None,
                });
            }
            ExecOutcome::Continue
        }
    }
}

/// Inner execution logic, dispatching each directive to its semantics.
async fn execute_inner(
    shared: &Arc<ServerShared>,
    directive: Directive,
) -> Result<ExecOutcome, (Fault, FaultContext)> {
    match directive {
        Directive::Emit { signal, dispatch } => {
            let hint = dispatch.or_else(|| signal.dispatch.clone());
            let sink = shared.dispatch_sink(hint.as_ref());
            let agent_id = shared.config.id.clone();
            // Fire-and-forget: the drain loop never blocks on a sink.
            tokio::spawn(async move {
                if let Err(e) = sink.dispatch(&signal).await {
                    tracing::warn!(%agent_id, error = %e, "emit dispatch failed");
                }
            });
            Ok(ExecOutcome::Continue)
        }

        Directive::Error { error, context } => {
            let (count, agent) = {
                let mut st = shared.state.lock();
                st.error_count += 1;
                st.metrics.faults += 1;
                (st.error_count, st.agent.clone())
            };
            match decide(&shared.config.error_policy, &error, context, count, &agent) {
                PolicyOutcome::Continue => Ok(ExecOutcome::Continue),
                PolicyOutcome::Emit(hint) => {
                    let data = json!({
                        "error": error.to_string(),
                        "context": context.to_string(),
                        "agent_id": shared.config.id,
                    });
                    match Signal::builder(AGENT_ERROR_TYPE)
                        .source(shared.config.source.clone())
                        .data(data)
                        .build()
                    {
                        Ok(signal) => {
                            let sink = shared.dispatch_sink(Some(&hint));
                            let agent_id = shared.config.id.clone();
                            tokio::spawn(async move {
                                if let Err(e) = sink.dispatch(&signal).await {
                                    tracing::warn!(%agent_id, error = %e, "error signal dispatch failed");
                                }
                            });
                        }
                        Err(e) => {
                            tracing::warn!(agent_id = %shared.config.id, error = %e, "bad error signal");
                        }
                    }
                    Ok(ExecOutcome::Continue)
                }
                PolicyOutcome::Stop(reason) => Ok(ExecOutcome::Stop(reason)),
            }
        }

        Directive::Schedule { delay, message } => {
            let timer = TimerRef::new();
            let handle = scheduler::arm_timer(mailbox_sink(shared), timer, delay, message);
            shared.state.lock().scheduled_timers.insert(timer, handle);
            Ok(ExecOutcome::Continue)
        }

        Directive::Spawn { spec, tag } => {
            let tag = match tag {
                Some(tag) => ChildTag::Named(tag),
                None => ChildTag::Spawn(MonitorRef::new()),
            };
            match (shared.config.spawn_fun)(spec) {
                Ok(SpawnResult::Spawned(task)) => {
                    track_task_child(shared, tag, task, Value::Null);
                    Ok(ExecOutcome::Continue)
                }
                Ok(SpawnResult::SpawnedWithInfo(task, info)) => {
                    track_task_child(shared, tag, task, info);
                    Ok(ExecOutcome::Continue)
                }
                Ok(SpawnResult::Ignored) => Ok(ExecOutcome::Continue),
                Err(e) => Err((Fault::Spawn { reason: e.to_string() }, FaultContext::Spawn)),
            }
        }

        Directive::SpawnAgent { agent, tag, opts, meta } => {
            if !shared.config.supervised {
                return Err((
                    Fault::Spawn { reason: crate::children::SpawnError::SupervisorMissing.to_string() },
                    FaultContext::SpawnAgent,
                ));
            }
            let child_id = opts
                .id
                .clone()
                .unwrap_or_else(|| format!("{}/{}", shared.config.id, tag));
            let parent = crate::children::ParentRef::new(
                shared.config.id.clone(),
                tag.clone(),
                shared.exit_tx.subscribe(),
            )
            .with_meta(meta.clone());

            let mut options = StartOptions::new(agent)
                .id(child_id)
                .initial_state(opts.initial_state.clone())
                .parent(parent)
                .skip_schedules(opts.skip_schedules)
                .spawn_fun(Arc::clone(&shared.config.spawn_fun))
                .default_dispatch(Arc::clone(&shared.config.default_dispatch))
                .telemetry(Arc::clone(&shared.config.telemetry))
                .clock(Arc::clone(&shared.config.clock))
                .plugin_timeout(shared.config.plugin_timeout);
            options.dispatchers = shared.config.dispatchers.clone();
            if let Some(registry) = &shared.config.registry {
                options = options.registry(registry.clone());
            }
            if let Some(max) = opts.max_queue_size {
                options = options.max_queue_size(max);
            }
            if let Some(behaviour) = opts.on_parent_death {
                options = options.on_parent_death(behaviour);
            }

            match crate::server::start(options) {
                Ok(child) => {
                    track_agent_child(shared, ChildTag::Named(tag), child, meta);
                    Ok(ExecOutcome::Continue)
                }
                Err(e) => {
                    Err((Fault::Spawn { reason: e.to_string() }, FaultContext::SpawnAgent))
                }
            }
        }

        Directive::StopChild { tag, reason } => {
            let info = { shared.state.lock().children.shift_remove(&tag) };
            if let Some(info) = info {
                // Monitor first so the explicit stop does not also deliver a
                // child-exit signal.
                info.monitor_task.abort();
                info.abort(&reason);
            }
            Ok(ExecOutcome::Continue)
        }

        Directive::Stop { reason } => {
            if reason == ExitReason::Normal {
                // Indistinguishable from supervision-requested termination,
                // and irreversible.
                tracing::warn!(
                    agent_id = %shared.config.id,
                    "hard stop requested with reason normal; terminating server"
                );
            }
            Ok(ExecOutcome::Stop(reason))
        }

        Directive::CronRegister { expr, message, job_id, timezone } => {
            let job = job_id.unwrap_or_default();
            match scheduler::arm_cron(mailbox_sink(shared), job, &expr, timezone.as_deref(), message)
            {
                Ok(handle) => {
                    let previous = shared.state.lock().cron_jobs.insert(job, handle);
                    if let Some(old) = previous {
                        old.cancel();
                    }
                    Ok(ExecOutcome::Continue)
                }
                Err(e) => Err((Fault::Cron { reason: e.to_string() }, FaultContext::Cron)),
            }
        }

        Directive::CronCancel { job_id } => {
            if let Some(handle) = shared.state.lock().cron_jobs.remove(&job_id) {
                handle.cancel();
            }
            Ok(ExecOutcome::Continue)
        }

        Directive::SetState { path, value } => {
            shared.state.lock().agent.set_path(&path, value);
            Ok(ExecOutcome::Continue)
        }
    }
}
