// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Jido Contributors

use super::*;
use crate::signal::Signal;

fn signal() -> Signal {
    match Signal::builder("tick").source("jido://test").build() {
        Ok(s) => s,
        Err(e) => panic!("build failed: {e}"),
    }
}

#[tokio::test]
async fn channel_dispatcher_delivers() {
    let (sink, mut rx) = ChannelDispatcher::pair(4);
    let s = signal();
    sink.dispatch(&s).await.unwrap();

    let got = rx.recv().await.unwrap();
    assert_eq!(got, s);
}

#[tokio::test]
async fn channel_dispatcher_reports_closed() {
    let (sink, rx) = ChannelDispatcher::pair(1);
    drop(rx);
    let err = sink.dispatch(&signal()).await.unwrap_err();
    assert!(matches!(err, DispatchError::Closed));
}

#[tokio::test]
async fn null_dispatcher_accepts_everything() {
    NullDispatcher.dispatch(&signal()).await.unwrap();
}

#[tokio::test]
async fn logger_dispatcher_accepts_everything() {
    LoggerDispatcher.dispatch(&signal()).await.unwrap();
}

#[test]
fn hint_serde_omits_null_config() {
    let hint = DispatchHint::named("logger");
    let json = serde_json::to_value(&hint).unwrap();
    assert!(json.get("config").is_none());

    let back: DispatchHint = serde_json::from_value(json).unwrap();
    assert_eq!(back, hint);
}
