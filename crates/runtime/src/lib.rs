// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jido-runtime: the per-agent Agent Server and its collaborators.
//!
//! An agent is a long-lived, individually-addressable state machine: a typed
//! state record, a routing table from signal types to actions, and optional
//! plugins, strategies, and lifecycle hooks. The server owns the agent's
//! bounded mailbox and drain loop, executes directives, supervises children,
//! and delivers timers and cron ticks back into the mailbox.

pub mod action;
pub mod agent;
pub mod children;
pub mod directive;
pub mod errors;
pub mod instance;
pub mod lifecycle;
pub mod options;
pub mod plugin;
pub mod policy;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod sensor;
pub mod server;
pub mod state;
pub mod status;
pub mod strategy;

pub use action::{Action, ActionCtx, ActionError, ActionOutcome};
pub use agent::{AgentModule, AgentValue, RouteCtx};
pub use children::{
    ChildHandle, ChildInfo, ChildSpec, ChildTag, ExitReason, OnParentDeath, ParentRef, SpawnError,
    SpawnFun, SpawnResult, SpawnedTask,
};
pub use directive::{AgentSpec, ChildStartOpts, Directive, Fault, FaultContext, ScheduleMessage};
pub use errors::{InstanceError, OptionsError, ServerError, StartError};
pub use instance::{AgentSupervisor, Instance, TaskSupervisor};
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleHooks};
pub use options::{StartOptions, DEFAULT_MAX_QUEUE_SIZE};
pub use plugin::{
    HandleOutcome, Plugin, PluginCtx, PluginError, PluginInstance, PluginSchedule,
    DEFAULT_PLUGIN_TIMEOUT,
};
pub use policy::{ErrorPolicy, PolicyDecision, PolicyFn};
pub use registry::{via_tuple, whereis, Registry, RegistryError};
pub use scheduler::{CronError, CronHandle, TimerHandle};
pub use sensor::Sensor;
pub use server::{start, AgentHandle, ServerRef};
pub use state::{AgentStatus, Metrics, StateSnapshot};
pub use status::{Status, StatusStream};
pub use strategy::{DefaultStrategy, RunPhase, StatusSnapshot, Strategy, StrategyView};
