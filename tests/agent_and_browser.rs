// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use futures::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use vibecanvas::config::HubConfig;
use vibecanvas::mcp::{Dispatcher, RpcSession};

async fn rpc(session: &mut RpcSession, id: u64, method: &str, params: Value) -> Value {
    let line = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}).to_string();
    let response = session.handle_line(&line).await.expect("response");
    serde_json::to_value(response).unwrap()
}

async fn tool(session: &mut RpcSession, id: u64, name: &str, arguments: Value) -> Value {
    let response =
        rpc(session, id, "tools/call", json!({"name": name, "arguments": arguments})).await;
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("{name} failed: {response}"));
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn agent_changes_reach_the_browser() {
    let dispatcher = Dispatcher::new(HubConfig::default());
    let mut session = RpcSession::new(dispatcher.registry().unwrap());
    rpc(&mut session, 1, "initialize", json!({"protocolVersion": "2024-11-05"})).await;

    let started = tool(&mut session, 2, "vibe_start", json!({"mode": "component", "port": 0})).await;
    assert_eq!(started["status"], "starting");
    assert_eq!(started["mode"], "component");

    let mut port = 0;
    for _ in 0..200 {
        let status = tool(&mut session, 3, "project_status", json!({})).await;
        if status["hub"]["status"].as_str().is_some_and(|s| s.starts_with("listening")) {
            port = status["hub"]["port"].as_u64().unwrap();
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_ne!(port, 0, "hub never started listening");

    let (mut browser, _) = connect_async(format!("ws://127.0.0.1:{port}/ws")).await.unwrap();

    let replay = next_frame(&mut browser).await;
    assert_eq!(replay["data"]["components"], json!([]));

    let added = tool(
        &mut session,
        4,
        "component_update",
        json!({"componentId": "nav-1", "action": "add", "type": "navigation", "category": "organism",
               "properties": {"items": ["Home", "About"]}}),
    )
    .await;
    assert_eq!(added, json!({"componentId": "nav-1", "action": "add", "components": 1}));

    let pushed = next_frame(&mut browser).await;
    assert_eq!(pushed["type"], "view_update");
    assert_eq!(pushed["data"]["components"][0]["properties"]["items"], json!(["Home", "About"]));

    let themed = tool(
        &mut session,
        5,
        "ui_update",
        json!({"type": "ui_update", "action": "update_theme",
               "data": {"primaryColor": "#ff0000"}, "explanation": "red"}),
    )
    .await;
    assert_eq!(themed["delta"]["theme_changed"], true);
    let pushed = next_frame(&mut browser).await;
    assert_eq!(pushed["data"]["theme"]["primaryColor"], "#ff0000");

    let view = tool(&mut session, 6, "view_state", json!({})).await;
    assert_eq!(view["clients"], 1);
    assert_eq!(view["view_state"]["components"][0]["id"], "nav-1");

    dispatcher.shutdown().await;
}

async fn next_frame(browser: &mut WebSocketStream<MaybeTlsStream<TcpStream>>) -> Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), browser.next())
            .await
            .expect("frame within deadline")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}
