// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! jido-core: value types for the jido agent runtime.
//!
//! Everything here is pure data plus thin adapter seams: the signal envelope,
//! trace propagation, routing patterns and tables, dispatch hints, telemetry
//! events, clocks, and inline IDs. The Agent Server itself lives in
//! `jido-runtime`.

pub mod clock;
pub mod dispatch;
pub mod id;
pub mod pattern;
pub mod route;
pub mod signal;
pub mod telemetry;
pub mod trace;

pub use clock::{Clock, FakeClock, SystemClock};
pub use dispatch::{
    ChannelDispatcher, DispatchError, DispatchHint, DispatchSink, Dispatcher, LoggerDispatcher,
    NullDispatcher,
};
pub use id::{short, CronJobId, MonitorRef, SignalId, SpanId, TimerRef, TraceId, WaiterRef};
pub use pattern::{Pattern, PatternError};
pub use route::{Predicate, RouteError, RouteSpec, Router, Target};
pub use signal::{Signal, SignalBuilder, SignalError};
#[cfg(any(test, feature = "test-support"))]
pub use telemetry::RecordingTelemetry;
pub use telemetry::{Telemetry, TelemetryEvent, TelemetrySink, TracingTelemetry};
pub use trace::TraceEnvelope;
