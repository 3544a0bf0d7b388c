// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! The Agent Server: mailbox, drain loop, signal pipeline, directive
//! execution, supervision, and termination.
//!
//! One server per agent. The server owns its [`AgentState`] exclusively
//! through a drain task; callers interact through a cheap clonable
//! [`AgentHandle`] or a registry-bound [`ServerRef`].

mod drain;
mod executor;
mod init;
mod pipeline;

use crate::agent::{AgentModule, AgentValue, RouteCtx};
use crate::action::Action;
use crate::children::{
    ChildHandle, ChildInfo, ChildSpec, ChildTag, ExitReason, ParentRef, SpawnError, SpawnFun,
    SpawnedTask,
};
use crate::directive::ScheduleMessage;
use crate::errors::{ServerError, StartError};
use crate::lifecycle::Lifecycle;
use crate::options::StartOptions;
use crate::plugin::InstalledPlugin;
use crate::policy::ErrorPolicy;
use crate::registry::Registry;
use crate::scheduler::SchedulerSink;
use crate::state::{AgentState, AgentStatus, QueueEntry, StateSnapshot};
use crate::status::{Status, StatusStream};
use crate::strategy::{DefaultStrategy, Strategy, StrategyView};
use jido_core::clock::Clock;
use jido_core::dispatch::{DispatchHint, DispatchSink};
use jido_core::id::{CronJobId, MonitorRef, TimerRef, WaiterRef};
use jido_core::route::Router;
use jido_core::signal::{types as signal_types, Signal};
use jido_core::telemetry::{TelemetryEvent, TelemetrySink};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch, Notify};

/// Control messages delivered out-of-band from monitors and stop requests.
#[derive(Debug)]
pub(crate) enum Control {
    ChildDown { tag: ChildTag, reason: ExitReason },
    ParentDown { reason: ExitReason },
    Stop { reason: ExitReason },
}

/// Immutable per-server configuration captured at start.
pub(crate) struct ServerConfig {
    pub id: String,
    pub module: Arc<dyn AgentModule>,
    pub module_name: String,
    pub strategy: Arc<dyn Strategy>,
    pub plugins: Vec<InstalledPlugin>,
    pub router: Router,
    pub actions: HashMap<String, Arc<dyn Action>>,
    pub error_policy: ErrorPolicy,
    pub plugin_timeout: Duration,
    pub default_dispatch: DispatchSink,
    pub dispatchers: HashMap<String, DispatchSink>,
    pub telemetry: TelemetrySink,
    pub clock: Arc<dyn Clock>,
    pub registry: Option<Registry>,
    pub spawn_fun: SpawnFun,
    /// Whether a real supervisor backs the spawn seam. Spawn directives fail
    /// explicitly otherwise; there is no process-wide fallback.
    pub supervised: bool,
    pub skip_schedules: bool,
    pub lifecycle: Lifecycle,
    /// Source path stamped on internally produced signals.
    pub source: String,
}

pub(crate) struct ServerShared {
    pub config: ServerConfig,
    pub state: Mutex<AgentState>,
    pub wake: Notify,
    pub control_tx: mpsc::UnboundedSender<Control>,
    pub exit_tx: watch::Sender<Option<ExitReason>>,
}

impl ServerShared {
    pub fn telemetry(&self, event: TelemetryEvent) {
        self.config.telemetry.emit(&event);
    }

    /// Resolve the dispatch sink for a hint; unknown sink names fall back to
    /// the default with a warning.
    pub fn dispatch_sink(&self, hint: Option<&DispatchHint>) -> DispatchSink {
        match hint {
            None => Arc::clone(&self.config.default_dispatch),
            Some(hint) => match self.config.dispatchers.get(&hint.sink) {
                Some(sink) => Arc::clone(sink),
                None => {
                    tracing::warn!(
                        agent_id = %self.config.id,
                        sink = %hint.sink,
                        "unknown dispatch sink, using default"
                    );
                    Arc::clone(&self.config.default_dispatch)
                }
            },
        }
    }

    /// Enqueue work. Overflow and shutdown are surfaced synchronously to the
    /// producer; nothing is enqueued on failure.
    pub fn enqueue(&self, entry: QueueEntry) -> Result<(), ServerError> {
        {
            let mut st = self.state.lock();
            if st.status == AgentStatus::ShuttingDown {
                return Err(ServerError::ShuttingDown);
            }
            if st.queue.len() >= st.max_queue_size {
                self.config.telemetry.emit(&TelemetryEvent::QueueOverflow {
                    agent_id: self.config.id.clone(),
                    queue_len: st.queue.len(),
                    max_queue_size: st.max_queue_size,
                });
                return Err(ServerError::QueueOverflow);
            }
            st.queue.push_back(entry);
        }
        self.wake.notify_one();
        Ok(())
    }

    /// Enqueue from an asynchronous producer (timer, sensor, monitor):
    /// failures are logged and the signal dropped.
    pub fn enqueue_internal(&self, signal: Signal) {
        if let Err(e) = self.enqueue(QueueEntry::Ingress { signal, replier: None }) {
            tracing::warn!(agent_id = %self.config.id, error = %e, "dropped internal signal");
        }
    }

    /// Deliver a timer/cron payload: a signal passes through, anything else
    /// is wrapped in a `jido.scheduled` signal.
    pub fn deliver_schedule_message(&self, message: ScheduleMessage) {
        let signal = match message {
            ScheduleMessage::Signal(signal) => signal,
            ScheduleMessage::Payload(payload) => {
                match Signal::builder(signal_types::SCHEDULED)
                    .source(self.config.source.clone())
                    .data(payload)
                    .build()
                {
                    Ok(signal) => signal,
                    Err(e) => {
                        tracing::warn!(agent_id = %self.config.id, error = %e, "bad scheduled payload");
                        return;
                    }
                }
            }
        };
        self.enqueue_internal(signal);
    }

    pub fn strategy_view(st: &AgentState) -> StrategyView {
        StrategyView {
            agent: st.agent.clone(),
            processing: st.processing,
            queue_len: st.queue.len(),
            error_count: st.error_count,
            shutting_down: st.status == AgentStatus::ShuttingDown,
        }
    }
}

/// Mailbox delivery seam handed to timer and cron tasks. Holds the server
/// weakly so armed timers never keep a dead server alive.
pub(crate) struct MailboxSink {
    shared: Weak<ServerShared>,
}

impl SchedulerSink for MailboxSink {
    fn timer_fired(&self, timer: TimerRef, message: ScheduleMessage) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        // Handle deletion on fire is mandatory; a fire racing a cancel finds
        // the handle gone and is ignored.
        let registered = shared.state.lock().scheduled_timers.remove(&timer).is_some();
        if !registered {
            return;
        }
        shared.deliver_schedule_message(message);
    }

    fn cron_fired(&self, job: CronJobId, message: ScheduleMessage) {
        let Some(shared) = self.shared.upgrade() else {
            return;
        };
        if !shared.state.lock().cron_jobs.contains_key(&job) {
            return;
        }
        shared.deliver_schedule_message(message);
    }
}

pub(crate) fn mailbox_sink(shared: &Arc<ServerShared>) -> Arc<dyn SchedulerSink> {
    Arc::new(MailboxSink { shared: Arc::downgrade(shared) })
}

/// Start an agent server from validated options. Requires a tokio runtime.
pub fn start(options: StartOptions) -> Result<AgentHandle, StartError> {
    let options = options.validate()?;
    let id = options.resolve_id();

    let module = Arc::clone(options.agent.module());
    let module_name = module.name().to_string();
    let mut agent = match &options.agent {
        crate::directive::AgentSpec::Module(m) => m.build(&id),
        crate::directive::AgentSpec::Value { agent, .. } => agent.clone(),
    };
    agent.id = id.clone();
    agent.deep_merge_state(&options.initial_state);

    let plugins = module
        .plugins()
        .into_iter()
        .map(InstalledPlugin::install)
        .collect::<Result<Vec<_>, _>>()?;

    // Plugin actions first, agent actions override on name collision.
    let mut actions: HashMap<String, Arc<dyn Action>> = HashMap::new();
    for installed in &plugins {
        for action in installed.instance.plugin.actions() {
            actions.insert(action.name().to_string(), action);
        }
    }
    for action in module.actions() {
        actions.insert(action.name().to_string(), action);
    }

    let strategy = module
        .strategy()
        .unwrap_or_else(|| Arc::new(DefaultStrategy) as Arc<dyn Strategy>);

    let router = crate::router::build_router(crate::router::RouterSources {
        module: &module,
        strategy: &strategy,
        plugins: &plugins,
        ctx: RouteCtx { agent: agent.clone() },
        skip_schedules: options.skip_schedules,
    })?;

    // Route-target membership is validated at startup, not at dispatch time.
    for name in router.action_names() {
        if !actions.contains_key(name) {
            return Err(StartError::UnknownAction { action: name.to_string() });
        }
    }

    let supervised = options.spawn_fun.is_some();
    let spawn_fun = options
        .spawn_fun
        .clone()
        .unwrap_or_else(|| Arc::new(|_spec: ChildSpec| Err(SpawnError::SupervisorMissing)));

    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (exit_tx, _exit_rx) = watch::channel(None);

    let state = AgentState::new(
        id.clone(),
        module_name.clone(),
        agent,
        options.max_queue_size,
        options.parent.clone(),
        options.on_parent_death,
    );

    let shared = Arc::new(ServerShared {
        config: ServerConfig {
            id: id.clone(),
            source: format!("jido://agent/{id}"),
            module,
            module_name,
            strategy,
            plugins,
            router,
            actions,
            error_policy: options.error_policy.clone(),
            plugin_timeout: options.plugin_timeout,
            default_dispatch: options.default_dispatch.clone(),
            dispatchers: options.dispatchers.clone(),
            telemetry: options.telemetry.clone(),
            clock: options.clock.clone(),
            registry: options.registry.clone(),
            spawn_fun,
            supervised,
            skip_schedules: options.skip_schedules,
            lifecycle: options.lifecycle.clone(),
        },
        state: Mutex::new(state),
        wake: Notify::new(),
        control_tx,
        exit_tx,
    });

    let handle = AgentHandle { shared: Arc::clone(&shared) };

    if let Some(registry) = &shared.config.registry {
        registry
            .register(&id, handle.clone())
            .map_err(|_| StartError::IdTaken { id: id.clone() })?;
    }

    tokio::spawn(drain::run(shared, control_rx));
    Ok(handle)
}

/// Register a monitored child task in the parent's state.
pub(crate) fn track_task_child(
    shared: &Arc<ServerShared>,
    tag: ChildTag,
    task: SpawnedTask,
    meta: Value,
) {
    let SpawnedTask { id, join } = task;
    let abort = join.abort_handle();
    let monitor = MonitorRef::new();
    let control = shared.control_tx.clone();
    let monitor_tag = tag.clone();
    let monitor_task = tokio::spawn(async move {
        let reason = match join.await {
            Ok(()) => ExitReason::Normal,
            Err(e) if e.is_panic() => {
                ExitReason::Panic(crate::plugin::panic_message(e.into_panic()))
            }
            Err(_) => ExitReason::Killed,
        };
        let _ = control.send(Control::ChildDown { tag: monitor_tag, reason });
    })
    .abort_handle();

    shared.state.lock().children.insert(
        tag.clone(),
        ChildInfo {
            handle: ChildHandle::Task(abort),
            monitor,
            monitor_task,
            module: None,
            id,
            tag,
            meta,
        },
    );
}

/// Register a monitored child agent server in the parent's state.
pub(crate) fn track_agent_child(
    shared: &Arc<ServerShared>,
    tag: ChildTag,
    child: AgentHandle,
    meta: Value,
) {
    let monitor = MonitorRef::new();
    let control = shared.control_tx.clone();
    let monitor_tag = tag.clone();
    let watcher = child.clone();
    let monitor_task = tokio::spawn(async move {
        let reason = watcher.wait_exit().await;
        let _ = control.send(Control::ChildDown { tag: monitor_tag, reason });
    })
    .abort_handle();

    let module = Some(child.module_name().to_string());
    let id = child.id().to_string();
    shared.state.lock().children.insert(
        tag.clone(),
        ChildInfo {
            handle: ChildHandle::Agent(child),
            monitor,
            monitor_task,
            module,
            id,
            tag,
            meta,
        },
    );
}

/// Cheap clonable handle to a running agent server.
#[derive(Clone)]
pub struct AgentHandle {
    pub(crate) shared: Arc<ServerShared>,
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("id", &self.shared.config.id)
            .field("module", &self.shared.config.module_name)
            .field("alive", &self.alive())
            .finish()
    }
}

impl AgentHandle {
    pub fn id(&self) -> &str {
        &self.shared.config.id
    }

    pub fn module_name(&self) -> &str {
        &self.shared.config.module_name
    }

    /// Synchronous send: enqueue the signal and await the agent view after
    /// this signal's directives have executed, with plugin result transforms
    /// applied.
    pub async fn call(&self, signal: Signal) -> Result<AgentValue, ServerError> {
        let (tx, rx) = oneshot::channel();
        self.shared.enqueue(QueueEntry::Ingress { signal, replier: Some(tx) })?;
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(ServerError::ReplyDropped),
        }
    }

    /// Fire-and-forget send: enqueue and return. No result transform.
    pub fn cast(&self, signal: Signal) -> Result<(), ServerError> {
        self.shared.enqueue(QueueEntry::Ingress { signal, replier: None })
    }

    /// Snapshot of the entire state. Never blocks on post-init.
    pub fn state(&self) -> StateSnapshot {
        self.shared.state.lock().snapshot()
    }

    /// Scheduler-computed status snapshot.
    pub fn status(&self) -> Status {
        let (view, state) = {
            let st = self.shared.state.lock();
            (ServerShared::strategy_view(&st), st.snapshot())
        };
        let snapshot = self.shared.config.strategy.snapshot(&view);
        Status {
            agent_module: self.shared.config.module_name.clone(),
            agent_id: self.shared.config.id.clone(),
            server: self.clone(),
            snapshot,
            state,
        }
    }

    /// Restartable, infinite polling stream of status snapshots.
    pub fn stream_status(&self, interval: Duration) -> StatusStream {
        StatusStream::new(self.clone(), interval)
    }

    /// Park until the agent reaches a terminal result or the timeout fires.
    /// Returns immediately when the agent is already terminal. Parked callers
    /// receive a shutdown error when the server stops; timed-out waiters are
    /// removed from state.
    pub async fn await_completion(
        &self,
        timeout: Duration,
    ) -> Result<Option<Value>, ServerError> {
        let (waiter, rx) = {
            let mut st = self.shared.state.lock();
            let view = ServerShared::strategy_view(&st);
            let snapshot = self.shared.config.strategy.snapshot(&view);
            if snapshot.done {
                return Ok(snapshot.result);
            }
            if st.status == AgentStatus::ShuttingDown || !self.alive() {
                return Err(ServerError::ShuttingDown);
            }
            let (tx, rx) = oneshot::channel();
            let waiter = WaiterRef::new();
            st.completion_waiters.insert(waiter, tx);
            (waiter, rx)
        };
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(ServerError::ShuttingDown),
            Err(_) => {
                self.shared.state.lock().completion_waiters.remove(&waiter);
                Err(ServerError::Timeout)
            }
        }
    }

    /// Never panics; false once the server has terminated.
    pub fn alive(&self) -> bool {
        self.shared.exit_tx.subscribe().borrow().is_none()
    }

    /// Request termination and wait for the server to exit.
    pub async fn stop(&self, reason: ExitReason) {
        self.stop_async(reason);
        self.wait_exit().await;
    }

    /// Request termination without waiting.
    pub(crate) fn stop_async(&self, reason: ExitReason) {
        let _ = self.shared.control_tx.send(Control::Stop { reason });
    }

    /// Wait for the server to exit and return its exit reason.
    pub async fn wait_exit(&self) -> ExitReason {
        let mut rx = self.shared.exit_tx.subscribe();
        loop {
            if let Some(reason) = rx.borrow_and_update().clone() {
                return reason;
            }
            if rx.changed().await.is_err() {
                return ExitReason::NoProc;
            }
        }
    }

    /// Monitor seam handed to children via `ParentRef`.
    pub(crate) fn exit_subscribe(&self) -> watch::Receiver<Option<ExitReason>> {
        self.shared.exit_tx.subscribe()
    }

    /// Build a `ParentRef` naming this server as the parent.
    pub fn parent_ref(&self, tag: impl Into<String>) -> ParentRef {
        ParentRef::new(self.id(), tag, self.exit_subscribe())
    }
}

/// How callers may address a server: a live handle, a registry-bound
/// reference, or a bare id. Bare ids are always rejected; they require an
/// explicit registry to be meaningful.
#[derive(Clone, Debug)]
pub enum ServerRef {
    Handle(AgentHandle),
    Via { registry: Registry, id: String },
    Bare(String),
}

impl From<AgentHandle> for ServerRef {
    fn from(handle: AgentHandle) -> Self {
        ServerRef::Handle(handle)
    }
}

impl From<&str> for ServerRef {
    fn from(id: &str) -> Self {
        ServerRef::Bare(id.to_string())
    }
}

impl ServerRef {
    /// Resolve to a live handle. Dead servers and missing names are
    /// `NotFound`; bare strings are rejected explicitly; never panics.
    pub fn resolve(&self) -> Result<AgentHandle, ServerError> {
        match self {
            ServerRef::Handle(handle) => {
                if handle.alive() {
                    Ok(handle.clone())
                } else {
                    Err(ServerError::NotFound)
                }
            }
            ServerRef::Via { registry, id } => registry
                .whereis(id)
                .filter(AgentHandle::alive)
                .ok_or(ServerError::NotFound),
            ServerRef::Bare(_) => Err(ServerError::RequiresRegistryLookup),
        }
    }

    /// Never exits the caller; always returns a boolean.
    pub fn alive(&self) -> bool {
        self.resolve().map(|h| h.alive()).unwrap_or(false)
    }

    pub async fn call(&self, signal: Signal) -> Result<AgentValue, ServerError> {
        self.resolve()?.call(signal).await
    }

    pub fn cast(&self, signal: Signal) -> Result<(), ServerError> {
        self.resolve()?.cast(signal)
    }

    pub fn state(&self) -> Result<StateSnapshot, ServerError> {
        Ok(self.resolve()?.state())
    }

    pub fn status(&self) -> Result<Status, ServerError> {
        Ok(self.resolve()?.status())
    }
}

#[cfg(test)]
#[path = "../runtime_tests/mod.rs"]
mod tests;
