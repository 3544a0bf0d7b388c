// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use crate::directive::ScheduleMessage;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;

enum Fired {
    Timer(TimerRef),
    Cron(CronJobId),
}

struct RecordingSink {
    tx: mpsc::UnboundedSender<Fired>,
}

impl SchedulerSink for RecordingSink {
    fn timer_fired(&self, timer: TimerRef, _message: ScheduleMessage) {
        let _ = self.tx.send(Fired::Timer(timer));
    }

    fn cron_fired(&self, job: CronJobId, _message: ScheduleMessage) {
        let _ = self.tx.send(Fired::Cron(job));
    }
}

fn sink() -> (Arc<dyn SchedulerSink>, mpsc::UnboundedReceiver<Fired>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(RecordingSink { tx }), rx)
}

#[tokio::test]
async fn timer_fires_after_delay() {
    let (sink, mut rx) = sink();
    let timer = TimerRef::new();
    let _handle = arm_timer(
        sink,
        timer,
        Duration::from_millis(10),
        ScheduleMessage::Payload(json!({"tick": 1})),
    );

    let fired = tokio::time::timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap();
    match fired {
        Fired::Timer(t) => assert_eq!(t, timer),
        Fired::Cron(_) => panic!("unexpected cron firing"),
    }
}

#[tokio::test]
async fn cancelled_timer_never_fires() {
    let (sink, mut rx) = sink();
    let handle = arm_timer(
        sink,
        TimerRef::new(),
        Duration::from_millis(20),
        ScheduleMessage::Payload(json!(null)),
    );
    handle.cancel();

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn dropping_handle_cancels_timer() {
    let (sink, mut rx) = sink();
    let handle = arm_timer(
        sink,
        TimerRef::new(),
        Duration::from_millis(20),
        ScheduleMessage::Payload(json!(null)),
    );
    drop(handle);

    tokio::time::sleep(Duration::from_millis(80)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn cron_fires_on_every_second_schedule() {
    let (sink, mut rx) = sink();
    let job = CronJobId::new();
    let _handle = arm_cron(
        sink,
        job,
        "* * * * * *",
        None,
        ScheduleMessage::Payload(json!(null)),
    )
    .unwrap();

    let fired = tokio::time::timeout(Duration::from_secs(3), rx.recv()).await.unwrap().unwrap();
    match fired {
        Fired::Cron(j) => assert_eq!(j, job),
        Fired::Timer(_) => panic!("unexpected timer firing"),
    }
}

#[tokio::test]
async fn cancelled_cron_stops_firing() {
    let (sink, mut rx) = sink();
    let handle = arm_cron(
        sink,
        CronJobId::new(),
        "* * * * * *",
        None,
        ScheduleMessage::Payload(json!(null)),
    )
    .unwrap();
    handle.cancel();

    tokio::time::sleep(Duration::from_millis(1200)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn invalid_cron_expression_rejected() {
    let (sink, _rx) = sink();
    let err = arm_cron(
        sink,
        CronJobId::new(),
        "not a cron",
        None,
        ScheduleMessage::Payload(json!(null)),
    )
    .unwrap_err();
    assert!(matches!(err, CronError::InvalidExpr { .. }));
}

#[tokio::test]
async fn unknown_timezone_rejected() {
    let (sink, _rx) = sink();
    let err = arm_cron(
        sink,
        CronJobId::new(),
        "* * * * * *",
        Some("Mars/Olympus"),
        ScheduleMessage::Payload(json!(null)),
    )
    .unwrap_err();
    assert_eq!(err, CronError::UnknownTimezone("Mars/Olympus".to_string()));
}

#[tokio::test]
async fn utc_and_local_timezones_accepted() {
    let (sink, _rx) = sink();
    for tz in [None, Some("UTC"), Some("utc"), Some("local")] {
        let handle = arm_cron(
            Arc::clone(&sink),
            CronJobId::new(),
            "0 0 1 1 1 *",
            tz,
            ScheduleMessage::Payload(json!(null)),
        );
        assert!(handle.is_ok(), "timezone {tz:?} rejected");
    }
}
