// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The signal pipeline: trace stamping, plugin middleware, routing, action
//! invocation, directive stamping, and result transformation.

use super::drain::{Batch, DrainCtx};
use super::ServerShared;
use crate::action::{ActionCtx, ActionError};
use crate::agent::AgentValue;
use crate::directive::{Directive, Fault, FaultContext, ScheduleMessage};
use crate::errors::ServerError;
use crate::plugin::{guard, panic_message, HandleOutcome, PluginCtx};
use crate::state::{QueueEntry, Replier};
use futures_util::FutureExt;
use jido_core::route::Target;
use jido_core::signal::Signal;
use jido_core::telemetry::TelemetryEvent;
use jido_core::trace::TraceEnvelope;
use std::sync::Arc;
use std::time::Instant;

pub(crate) async fn process_signal(
    shared: &Arc<ServerShared>,
    signal: Signal,
    mut replier: Option<Replier>,
    drain: &mut DrainCtx,
) {
    let started = shared.config.clock.now();

    // Ingress trace stamping: preserve an existing envelope, open a fresh
    // root otherwise.
    let signal = signal.ensure_trace();
    let trace = signal.trace.unwrap_or_else(TraceEnvelope::root);
    shared.telemetry(TelemetryEvent::SignalStart {
        system_time_ms: shared.config.clock.epoch_ms(),
        agent_id: shared.config.id.clone(),
        agent_module: shared.config.module_name.clone(),
        signal_type: signal.ty.clone(),
        trace,
    });

    let mut current = signal;
    let mut override_target: Option<Target> = None;

    // Plugin middleware, declaration order. Pattern-filtered; a failure
    // aborts this signal and bypasses the remaining plugins and routing.
    for installed in &shared.config.plugins {
        if !installed.applies_to(&current) {
            continue;
        }
        let plugin = Arc::clone(&installed.instance.plugin);
        let ctx = PluginCtx {
            agent: shared.state.lock().agent.clone(),
            state_key: installed.state_key().to_string(),
            config: installed.instance.config.clone(),
            trace: current.trace,
        };
        let input = current.clone();
        let result = guard(shared.config.plugin_timeout, async move {
            plugin.handle_signal(input, ctx).await
        })
        .await;

        match result {
            Ok(HandleOutcome::Continue) => {}
            Ok(HandleOutcome::Replace(mut replacement)) => {
                if replacement.trace.is_none() {
                    replacement.trace = current.trace;
                }
                current = replacement;
            }
            Ok(HandleOutcome::Override { action, params, signal: replacement }) => {
                if let Some(mut s) = replacement {
                    if s.trace.is_none() {
                        s.trace = current.trace;
                    }
                    current = s;
                }
                override_target = Some(match params {
                    Some(params) => Target::instruction(action, params),
                    None => Target::action(action),
                });
                break;
            }
            Err(err) => {
                let plugin_key = installed.state_key().to_string();
                tracing::warn!(
                    agent_id = %shared.config.id,
                    plugin = %plugin_key,
                    signal_type = %current.ty,
                    error = %err,
                    "plugin failed, aborting signal"
                );
                reply_err(
                    &mut replier,
                    ServerError::Plugin { plugin: plugin_key, reason: err.to_string() },
                );
                shared.telemetry(TelemetryEvent::SignalException {
                    duration: shared.config.clock.now().saturating_duration_since(started),
                    agent_id: shared.config.id.clone(),
                    signal_type: current.ty.clone(),
                    kind: "plugin".to_string(),
                    reason: err.to_string(),
                });
                return;
            }
        }
    }

    // Routing, unless an override fired.
    let targets = match override_target {
        Some(target) => vec![target],
        None => match shared.config.router.route(&current) {
            Ok(targets) => targets,
            Err(err) => {
                let signal_type = current.ty.clone();
                // The routing error still flows through the error policy.
                append_directives(
                    shared,
                    vec![Directive::Error {
                        error: Fault::Routing { signal_type: signal_type.clone() },
                        context: FaultContext::Routing,
                    }],
                    &current,
                    None,
                    &mut None,
                );
                reply_err(&mut replier, ServerError::NoRoute { signal_type: signal_type.clone() });
                shared.telemetry(TelemetryEvent::SignalException {
                    duration: shared.config.clock.now().saturating_duration_since(started),
                    agent_id: shared.config.id.clone(),
                    signal_type,
                    kind: "routing".to_string(),
                    reason: err.to_string(),
                });
                return;
            }
        },
    };

    // Action invocation. Effects commit per action, so later actions in the
    // same pass see earlier changes; a failed action commits nothing.
    let mut agent = shared.state.lock().agent.clone();
    let mut produced: Vec<Directive> = Vec::new();

    for target in targets {
        let target = shared
            .config
            .module
            .on_before_cmd(&agent, &target)
            .unwrap_or(target);
        let action_name = target.action_name().to_string();

        let Some(action) = shared.config.actions.get(&action_name).cloned() else {
            produced.push(Directive::Error {
                error: Fault::UnknownAction { action: action_name.clone() },
                context: FaultContext::Action,
            });
            reply_err(&mut replier, ServerError::UnknownAction { action: action_name.clone() });
            signal_exception(shared, started, &current.ty, "action", "unknown action");
            break;
        };

        let params = target
            .params()
            .cloned()
            .unwrap_or_else(|| current.data.clone());
        let ctx = ActionCtx {
            agent: agent.clone(),
            signal: current.clone(),
            trace: current.trace.unwrap_or_else(TraceEnvelope::root),
        };

        let run = std::panic::AssertUnwindSafe(action.run(params, ctx))
            .catch_unwind()
            .await;
        let outcome = match run {
            Ok(result) => result,
            Err(payload) => Err(ActionError::Failed(format!(
                "panicked: {}",
                panic_message(payload)
            ))),
        };

        match outcome {
            Ok(mut out) => {
                agent.merge_state(&out.effects);
                shared
                    .config
                    .module
                    .on_after_cmd(&mut agent, &target, &mut out.directives);
                shared.state.lock().agent = agent.clone();
                produced.extend(out.directives);
            }
            Err(err) => {
                tracing::warn!(
                    agent_id = %shared.config.id,
                    action = %action_name,
                    signal_type = %current.ty,
                    error = %err,
                    "action failed"
                );
                produced.push(Directive::Error {
                    error: Fault::Action { action: action_name.clone(), reason: err.to_string() },
                    context: FaultContext::Action,
                });
                reply_err(
                    &mut replier,
                    ServerError::Action { action: action_name, reason: err.to_string() },
                );
                signal_exception(shared, started, &current.ty, "action", &err.to_string());
                break;
            }
        }
    }

    // Directive enqueueing: stamp child traces and append in production
    // order. Overflow bubbles to a synchronous caller; otherwise it is
    // logged and the remainder dropped.
    let directive_count = produced.len();
    let batch_id = if replier.is_some() && !produced.is_empty() {
        Some(drain.reserve())
    } else {
        None
    };
    let appended = append_directives(shared, produced, &current, batch_id, &mut replier);

    if let Some(r) = replier.take() {
        if appended == 0 {
            // No directives: the view is final now.
            let view = transform_view(shared, &current).await;
            let _ = r.send(Ok(view));
        } else if let Some(id) = batch_id {
            drain.insert(id, Batch { replier: r, remaining: appended, signal: current.clone() });
        }
    }

    shared.state.lock().metrics.signals_processed += 1;
    shared.telemetry(TelemetryEvent::SignalStop {
        duration: shared.config.clock.now().saturating_duration_since(started),
        agent_id: shared.config.id.clone(),
        signal_type: current.ty.clone(),
        directive_count,
    });
}

/// Apply `transform_result` across matching plugins, declaration order.
/// A crashing transform leaves the view as it was before that plugin.
pub(crate) async fn transform_view(shared: &Arc<ServerShared>, signal: &Signal) -> AgentValue {
    let mut view = shared.state.lock().agent.clone();
    for installed in &shared.config.plugins {
        if !installed.applies_to(signal) {
            continue;
        }
        let plugin = Arc::clone(&installed.instance.plugin);
        let ctx = PluginCtx {
            agent: view.clone(),
            state_key: installed.state_key().to_string(),
            config: installed.instance.config.clone(),
            trace: signal.trace,
        };
        let input = view.clone();
        let result = guard(shared.config.plugin_timeout, async move {
            Ok(plugin.transform_result(input, ctx).await)
        })
        .await;
        match result {
            Ok(transformed) => view = transformed,
            Err(err) => {
                tracing::warn!(
                    agent_id = %shared.config.id,
                    plugin = %installed.state_key(),
                    error = %err,
                    "transform_result failed, keeping untransformed view"
                );
            }
        }
    }
    view
}

fn reply_err(replier: &mut Option<Replier>, err: ServerError) {
    if let Some(r) = replier.take() {
        let _ = r.send(Err(err));
    }
}

fn signal_exception(
    shared: &Arc<ServerShared>,
    started: Instant,
    signal_type: &str,
    kind: &str,
    reason: &str,
) {
    shared.telemetry(TelemetryEvent::SignalException {
        duration: shared.config.clock.now().saturating_duration_since(started),
        agent_id: shared.config.id.clone(),
        signal_type: signal_type.to_string(),
        kind: kind.to_string(),
        reason: reason.to_string(),
    });
}

/// Stamp child traces derived from `origin` onto embedded signals.
fn stamp(directive: &mut Directive, origin: &Signal) {
    match directive {
        Directive::Emit { signal, .. } => {
            signal.trace = Some(origin.child_trace());
        }
        Directive::Schedule { message: ScheduleMessage::Signal(signal), .. } => {
            signal.trace = Some(origin.child_trace());
        }
        _ => {}
    }
}

/// Append directives to the back of the queue in production order.
/// Returns how many made it in before any overflow.
fn append_directives(
    shared: &Arc<ServerShared>,
    directives: Vec<Directive>,
    origin: &Signal,
    batch: Option<u64>,
    replier: &mut Option<Replier>,
) -> usize {
    let mut appended = 0;
    let mut st = shared.state.lock();
    for mut directive in directives {
        stamp(&mut directive, origin);
        if st.queue.len() >= st.max_queue_size {
            shared.config.telemetry.emit(&TelemetryEvent::QueueOverflow {
                agent_id: shared.config.id.clone(),
                queue_len: st.queue.len(),
                max_queue_size: st.max_queue_size,
            });
            if let Some(r) = replier.take() {
                let _ = r.send(Err(ServerError::QueueOverflow));
            } else {
                tracing::warn!(
                    agent_id = %shared.config.id,
                    "queue overflow, dropping produced directives"
                );
            }
            break;
        }
        st.queue.push_back(QueueEntry::Directive { directive, batch });
        appended += 1;
    }
    appended
}
