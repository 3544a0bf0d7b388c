// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Error types surfaced to callers of the agent server.

use jido_core::pattern::PatternError;
use jido_core::route::RouteError;
use thiserror::Error;

/// Errors returned by server operations (`call`, `cast`, `await_completion`,
/// reference resolution).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ServerError {
    /// The mailbox is full; nothing was enqueued.
    #[error("queue overflow")]
    QueueOverflow,
    /// The agent is shutting down (or already gone).
    #[error("agent is shutting down")]
    ShuttingDown,
    #[error("agent not found")]
    NotFound,
    /// A bare string was used where a registry-bound reference is required.
    #[error("server reference requires registry lookup")]
    RequiresRegistryLookup,
    #[error("no route matched signal type {signal_type:?}")]
    NoRoute { signal_type: String },
    #[error("plugin {plugin}: {reason}")]
    Plugin { plugin: String, reason: String },
    #[error("action {action}: {reason}")]
    Action { action: String, reason: String },
    #[error("unknown action {action:?}")]
    UnknownAction { action: String },
    /// The server dropped the reply channel mid-call.
    #[error("reply channel dropped")]
    ReplyDropped,
    #[error("timed out")]
    Timeout,
}

/// Start-argument validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OptionsError {
    #[error("max_queue_size must be positive")]
    InvalidQueueSize,
    #[error("max_errors must be positive")]
    InvalidMaxErrors,
}

/// Instance-level errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstanceError {
    #[error("instance name {0:?} is already taken")]
    NameTaken(String),
}

/// Errors starting an agent server.
#[derive(Debug, Error)]
pub enum StartError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error("agent id {id:?} is already registered")]
    IdTaken { id: String },
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("invalid plugin pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("route target references unknown action {action:?}")]
    UnknownAction { action: String },
}
