// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

//! Per-agent one-shot timers and cron jobs.
//!
//! Every handle stored in agent state corresponds to an actually armed task;
//! cancelling a handle aborts the task, and dropping state aborts whatever
//! is left. Deliveries go back into the owning mailbox through the sink.

use crate::directive::ScheduleMessage;
use chrono::Utc;
use cron::Schedule;
use jido_core::id::{CronJobId, TimerRef};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::AbortHandle;

/// Delivery seam back into the owning agent's mailbox.
///
/// Implementations check that the handle is still registered before
/// enqueueing, so firings of cancelled timers are ignored.
pub(crate) trait SchedulerSink: Send + Sync + 'static {
    fn timer_fired(&self, timer: TimerRef, message: ScheduleMessage);
    fn cron_fired(&self, job: CronJobId, message: ScheduleMessage);
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CronError {
    #[error("invalid cron expression {expr:?}: {reason}")]
    InvalidExpr { expr: String, reason: String },
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
}

/// Armed one-shot timer.
#[derive(Debug)]
pub struct TimerHandle {
    pub delay: Duration,
    abort: AbortHandle,
}

impl TimerHandle {
    pub(crate) fn cancel(&self) {
        self.abort.abort();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Armed cron job.
#[derive(Debug)]
pub struct CronHandle {
    pub expr: String,
    abort: AbortHandle,
}

impl CronHandle {
    pub(crate) fn cancel(&self) {
        self.abort.abort();
    }
}

impl Drop for CronHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Arm a one-shot timer delivering `message` after `delay`.
pub(crate) fn arm_timer(
    sink: Arc<dyn SchedulerSink>,
    timer: TimerRef,
    delay: Duration,
    message: ScheduleMessage,
) -> TimerHandle {
    let abort = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        sink.timer_fired(timer, message);
    })
    .abort_handle();
    TimerHandle { delay, abort }
}

/// Supported cron timezones. Arbitrary IANA zones would pull in a timezone
/// database; the runtime recognises UTC and the host-local zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CronTz {
    Utc,
    Local,
}

fn parse_timezone(timezone: Option<&str>) -> Result<CronTz, CronError> {
    match timezone {
        None => Ok(CronTz::Utc),
        Some(tz) if tz.eq_ignore_ascii_case("utc") => Ok(CronTz::Utc),
        Some(tz) if tz.eq_ignore_ascii_case("local") => Ok(CronTz::Local),
        Some(other) => Err(CronError::UnknownTimezone(other.to_string())),
    }
}

/// Time until the next occurrence, or `None` when the schedule is exhausted.
fn next_wait(schedule: &Schedule, tz: CronTz) -> Option<Duration> {
    let wait = match tz {
        CronTz::Utc => {
            let now = Utc::now();
            schedule.after(&now).next().map(|next| next - now)
        }
        CronTz::Local => {
            let now = chrono::Local::now();
            schedule.after(&now).next().map(|next| next - now)
        }
    };
    wait.map(|d| d.to_std().unwrap_or(Duration::ZERO))
}

/// Arm a recurring cron job delivering `message` on each occurrence.
pub(crate) fn arm_cron(
    sink: Arc<dyn SchedulerSink>,
    job: CronJobId,
    expr: &str,
    timezone: Option<&str>,
    message: ScheduleMessage,
) -> Result<CronHandle, CronError> {
    let schedule = Schedule::from_str(expr).map_err(|e| CronError::InvalidExpr {
        expr: expr.to_string(),
        reason: e.to_string(),
    })?;
    let tz = parse_timezone(timezone)?;

    let expr = expr.to_string();
    let abort = tokio::spawn({
        let expr = expr.clone();
        async move {
            loop {
                let Some(wait) = next_wait(&schedule, tz) else {
                    tracing::debug!(job = %job, expr, "cron schedule exhausted");
                    break;
                };
                tokio::time::sleep(wait).await;
                sink.cron_fired(job, message.clone());
            }
        }
    })
    .abort_handle();

    Ok(CronHandle { expr, abort })
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
