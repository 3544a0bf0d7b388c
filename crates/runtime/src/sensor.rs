// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Sensors: long-running signal producers owned by plugins.
//!
//! The runtime only starts sensors as monitored children and forwards their
//! emitted signals into the owning agent's mailbox; sensor internals live
//! outside the core.

use async_trait::async_trait;
use jido_core::signal::Signal;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Buffer between a sensor and its mailbox forwarder.
pub(crate) const SENSOR_BUFFER: usize = 64;

/// A subscription sensor. `run` should emit signals until the channel closes
/// or the sensor is done; the task is aborted on agent termination.
#[async_trait]
pub trait Sensor: Send + Sync {
    fn name(&self) -> &str;

    async fn run(self: Arc<Self>, emit: mpsc::Sender<Signal>);
}

#[cfg(test)]
#[path = "sensor_tests.rs"]
mod tests;
