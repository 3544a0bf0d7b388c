// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Dispatch sinks for outbound signals.
//!
//! The runtime forwards `Emit` directives through a [`Dispatcher`]. Concrete
//! back-ends (HTTP, buses) live outside the core; the built-ins here cover
//! logging, discard, and channel delivery for tests and sensors.

use crate::signal::Signal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Per-signal routing hint naming a configured sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchHint {
    /// Sink name (e.g. "logger", "bus").
    pub sink: String,
    /// Sink-specific configuration payload.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub config: serde_json::Value,
}

impl DispatchHint {
    pub fn named(sink: impl Into<String>) -> Self {
        Self { sink: sink.into(), config: serde_json::Value::Null }
    }
}

/// Errors surfaced by a dispatch sink.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("dispatch sink closed")]
    Closed,
    #[error("dispatch failed: {0}")]
    Failed(String),
}

/// Outbound signal sink.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, signal: &Signal) -> Result<(), DispatchError>;
}

/// Shared dispatcher handle.
pub type DispatchSink = Arc<dyn Dispatcher>;

/// Logs every dispatched signal at info level.
#[derive(Default)]
pub struct LoggerDispatcher;

#[async_trait]
impl Dispatcher for LoggerDispatcher {
    async fn dispatch(&self, signal: &Signal) -> Result<(), DispatchError> {
        tracing::info!(
            signal_id = %signal.id,
            signal_type = %signal.ty,
            source = %signal.source,
            "dispatched signal"
        );
        Ok(())
    }
}

/// Discards every signal.
#[derive(Default)]
pub struct NullDispatcher;

#[async_trait]
impl Dispatcher for NullDispatcher {
    async fn dispatch(&self, _signal: &Signal) -> Result<(), DispatchError> {
        Ok(())
    }
}

/// Delivers dispatched signals into an mpsc channel.
///
/// Used by tests to observe emissions and by sensor plumbing.
pub struct ChannelDispatcher {
    tx: tokio::sync::mpsc::Sender<Signal>,
}

impl ChannelDispatcher {
    pub fn new(tx: tokio::sync::mpsc::Sender<Signal>) -> Self {
        Self { tx }
    }

    /// Build a dispatcher plus the receiving end, with the given buffer.
    pub fn pair(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<Signal>) {
        let (tx, rx) = tokio::sync::mpsc::channel(buffer);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl Dispatcher for ChannelDispatcher {
    async fn dispatch(&self, signal: &Signal) -> Result<(), DispatchError> {
        self.tx.send(signal.clone()).await.map_err(|_| DispatchError::Closed)
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
