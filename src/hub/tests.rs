// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::oneshot::error::TryRecvError;

use super::{Hub, HubError, HubStatus, Registration};
use crate::config::HubConfig;
use crate::model::{Category, Component, ComponentId, ViewState};
use crate::ops::{ApplyError, Op};

fn hub_with_capacity(queue_capacity: usize) -> Hub {
    Hub::new(HubConfig { queue_capacity, ..HubConfig::default() })
}

fn component(id: &str) -> Component {
    Component::new(ComponentId::new(id).unwrap(), "button", Category::Atom)
}

fn next_json(rx: &mut mpsc::Receiver<Utf8Bytes>) -> Value {
    let frame = rx.try_recv().expect("queued frame");
    serde_json::from_str(frame.as_str()).unwrap()
}

fn drain_replay(registration: &mut Registration) {
    let replay = next_json(&mut registration.outbound);
    assert_eq!(replay["type"], "view_update");
}

#[test]
fn replay_is_the_first_queued_frame() {
    let hub = hub_with_capacity(8);
    hub.apply_ops(&[Op::AddComponent(component("btn-1"))], None).unwrap();

    let mut late = hub.register();
    let replay = next_json(&mut late.outbound);
    assert_eq!(replay["type"], "view_update");
    assert_eq!(replay["data"]["components"][0]["id"], "btn-1");
    assert!(late.outbound.try_recv().is_err());
    assert_eq!(hub.client_count(), 1);
}

#[test]
fn committed_ops_reach_every_client_but_the_origin() {
    let hub = hub_with_capacity(8);
    let mut a = hub.register();
    let mut b = hub.register();
    let mut c = hub.register();
    for registration in [&mut a, &mut b, &mut c] {
        drain_replay(registration);
    }

    let committed = hub.apply_ops(&[Op::AddComponent(component("btn-1"))], Some(&a.id)).unwrap();
    assert_eq!(committed.delivered, 2);
    assert_eq!(committed.rev, 1);
    assert_eq!(committed.result.delta.added, vec!["btn-1".to_owned()]);

    assert!(a.outbound.try_recv().is_err());
    for registration in [&mut b, &mut c] {
        let frame = next_json(&mut registration.outbound);
        assert_eq!(frame["data"]["components"][0]["id"], "btn-1");
    }
}

#[test]
fn hub_side_mutations_reach_all_clients() {
    let hub = hub_with_capacity(8);
    let mut a = hub.register();
    let mut b = hub.register();
    drain_replay(&mut a);
    drain_replay(&mut b);

    let committed = hub.apply_ops(&[Op::AddComponent(component("card-1"))], None).unwrap();
    assert_eq!(committed.delivered, 2);
    assert_eq!(next_json(&mut a.outbound)["type"], "view_update");
    assert_eq!(next_json(&mut b.outbound)["type"], "view_update");
}

#[test]
fn saturated_client_is_evicted_without_blocking_others() {
    let hub = hub_with_capacity(1);
    // The replay frame alone fills a capacity-one queue.
    let mut slow = hub.register();
    let mut fast = hub.register();
    drain_replay(&mut fast);

    let delivered = hub.broadcast(Utf8Bytes::from_static(r#"{"type":"ping"}"#), None);
    assert_eq!(delivered, 1);
    assert_eq!(hub.client_count(), 1);
    assert!(!hub.is_registered(&slow.id));
    assert!(hub.is_registered(&fast.id));
    assert_eq!(slow.closed.try_recv(), Err(TryRecvError::Closed));
    assert_eq!(next_json(&mut fast.outbound)["type"], "ping");
}

#[test]
fn failed_ops_neither_commit_nor_broadcast() {
    let hub = hub_with_capacity(8);
    let mut a = hub.register();
    drain_replay(&mut a);

    let missing = ComponentId::new("ghost").unwrap();
    let err = hub.apply_ops(&[Op::RemoveComponent { id: missing.clone() }], None).unwrap_err();
    assert_eq!(err, ApplyError::NotFound(missing));
    assert_eq!(hub.rev(), 0);
    assert!(hub.snapshot().is_empty());
    assert!(a.outbound.try_recv().is_err());
}

#[test]
fn replace_view_forwards_the_raw_frame_to_others() {
    let hub = hub_with_capacity(8);
    let mut a = hub.register();
    let mut b = hub.register();
    drain_replay(&mut a);
    drain_replay(&mut b);

    let mut view = ViewState::new();
    view.insert(component("hero")).unwrap();
    let raw = Utf8Bytes::from_static(r#"{"type":"view_update","data":{"components":[]}}"#);
    assert_eq!(hub.replace_view(view, raw.clone(), Some(&a.id)), 1);

    assert_eq!(b.outbound.try_recv().unwrap(), raw);
    assert!(a.outbound.try_recv().is_err());
    assert!(hub.snapshot().contains("hero"));
    assert_eq!(hub.rev(), 1);
}

#[test]
fn deregister_fires_the_close_signal() {
    let hub = hub_with_capacity(8);
    let mut a = hub.register();
    hub.deregister(&a.id);
    assert_eq!(hub.client_count(), 0);
    assert_eq!(a.closed.try_recv(), Err(TryRecvError::Closed));
    assert!(!hub.send_to(&a.id, Utf8Bytes::from_static("{}")));
}

#[tokio::test]
async fn bind_failure_is_reported_in_status() {
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = occupied.local_addr().unwrap().port();
    let hub = Hub::new(HubConfig::default().with_port(port));

    let err = hub.bind_and_serve().await.unwrap_err();
    assert!(matches!(err, HubError::Bind { .. }));
    match hub.status() {
        HubStatus::Failed { reason } => assert!(!reason.is_empty()),
        other => panic!("unexpected status {other:?}"),
    }
    assert!(hub.status().to_string().starts_with("failed: "));
}

#[tokio::test]
async fn shutdown_stops_the_server_and_drops_clients() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = Hub::new(HubConfig::default().with_port(addr.port()));
    let server = tokio::spawn({
        let hub = hub.clone();
        async move { hub.serve(listener).await }
    });

    for _ in 0..50 {
        if matches!(hub.status(), HubStatus::Listening { .. }) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(hub.local_addr(), addr);

    let mut client = hub.register();
    hub.shutdown();
    assert_eq!(hub.client_count(), 0);
    assert_eq!(client.closed.try_recv(), Err(TryRecvError::Closed));

    let served = tokio::time::timeout(Duration::from_secs(5), server).await.unwrap().unwrap();
    assert!(served.is_ok());
    assert_eq!(hub.status(), HubStatus::Stopped);
}
