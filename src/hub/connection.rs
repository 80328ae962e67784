// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::time::Duration;

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::frames::{
    self, ChatMessageData, ChatResponseData, GenerateRequestData, GenerateResponseData,
    InboundFrame,
};
use super::{Hub, Registration};
use crate::collab::{generate_or_fail, unix_millis, ChatRole, ChatTurn, GenerationRequest};
use crate::model::ClientId;
use crate::validate::{validate_ui_update, validate_view_state};

/// Chat turns kept per connection; older turns are dropped first.
const MAX_HISTORY_TURNS: usize = 40;

/// Deregisters the client on every exit path of the reader.
struct Deregister {
    hub: Hub,
    id: ClientId,
}

impl Drop for Deregister {
    fn drop(&mut self) {
        self.hub.deregister(&self.id);
    }
}

pub(super) async fn run(hub: Hub, socket: WebSocket) {
    let Registration { id, outbound, closed } = hub.register();
    let guard = Deregister { hub: hub.clone(), id: id.clone() };

    let (sink, stream) = socket.split();
    let writer = tokio::spawn(write_loop(
        sink,
        outbound,
        closed,
        hub.config().ping_interval,
        hub.config().write_deadline,
        id.clone(),
    ));

    let mut session = ClientSession { hub, id, history: Vec::new() };
    session.read_loop(stream, writer).await;
    drop(guard);
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<Utf8Bytes>,
    mut closed: oneshot::Receiver<()>,
    ping_interval: Duration,
    write_deadline: Duration,
    id: ClientId,
) {
    let mut ping = time::interval_at(Instant::now() + ping_interval, ping_interval);
    ping.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let message = tokio::select! {
            biased;
            _ = &mut closed => break,
            frame = outbound.recv() => match frame {
                Some(text) => Message::Text(text),
                None => break,
            },
            _ = ping.tick() => Message::Ping(Bytes::new()),
        };

        match time::timeout(write_deadline, sink.send(message)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                debug!(client_id = %id, error = %err, "websocket write failed");
                return;
            }
            Err(_) => {
                warn!(client_id = %id, "websocket write timed out");
                return;
            }
        }
    }

    // Best effort: the peer may already be gone.
    let _ = time::timeout(write_deadline, sink.send(Message::Close(None))).await;
}

struct ClientSession {
    hub: Hub,
    id: ClientId,
    history: Vec<ChatTurn>,
}

impl ClientSession {
    async fn read_loop(
        &mut self,
        mut stream: SplitStream<WebSocket>,
        mut writer: tokio::task::JoinHandle<()>,
    ) {
        let read_deadline = self.hub.config().read_deadline;
        let mut deadline = Instant::now() + read_deadline;

        loop {
            let next = tokio::select! {
                next = time::timeout_at(deadline, stream.next()) => next,
                _ = &mut writer => {
                    debug!(client_id = %self.id, "writer finished");
                    return;
                }
            };

            let message = match next {
                Err(_) => {
                    info!(client_id = %self.id, "read deadline expired");
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(err))) => {
                    debug!(client_id = %self.id, error = %err, "websocket read failed");
                    break;
                }
                Ok(Some(Ok(message))) => message,
            };

            match message {
                Message::Text(text) => self.handle_text(text).await,
                Message::Binary(_) => {
                    self.reply(frames::error_frame("binary", "binary frames are not supported"));
                }
                Message::Pong(_) => deadline = Instant::now() + read_deadline,
                Message::Ping(_) => {}
                Message::Close(_) => break,
            }
        }
    }

    fn reply(&self, frame: Utf8Bytes) {
        self.hub.send_to(&self.id, frame);
    }

    async fn handle_text(&mut self, text: Utf8Bytes) {
        let frame: InboundFrame = match serde_json::from_str(text.as_str()) {
            Ok(frame) => frame,
            Err(err) => {
                self.reply(frames::error_frame("frame", &format!("malformed frame: {err}")));
                return;
            }
        };

        match frame.kind.as_str() {
            frames::VIEW_UPDATE => self.on_view_update(frame.data, text),
            frames::GENERATE_REQUEST => self.on_generate(frame.data, frame.id).await,
            frames::CHAT_MESSAGE => self.on_chat(frame.data, frame.id).await,
            other => {
                debug!(client_id = %self.id, kind = other, "unknown frame type");
                self.reply(frames::error_frame(other, &format!("unknown message type '{other}'")));
            }
        }
    }

    fn on_view_update(&self, data: Value, raw: Utf8Bytes) {
        match validate_view_state(data) {
            Ok(view) => {
                let components = view.len();
                let delivered = self.hub.replace_view(view, raw, Some(&self.id));
                debug!(client_id = %self.id, components, delivered, "view update accepted");
            }
            Err(err) => {
                warn!(client_id = %self.id, error = %err, "view update rejected");
                self.reply(frames::error_frame(frames::VIEW_UPDATE, &err.to_string()));
            }
        }
    }

    async fn on_generate(&self, data: Value, id: Option<Value>) {
        let data: GenerateRequestData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(err) => {
                self.reply(frames::error_frame(
                    frames::GENERATE_REQUEST,
                    &format!("invalid generate request: {err}"),
                ));
                return;
            }
        };

        let request = GenerationRequest::with_defaults(
            data.project_name,
            data.database,
            data.features,
            data.schema,
            unix_millis(),
        );
        info!(client_id = %self.id, project = %request.project_name, "generate request");
        let result = generate_or_fail(self.hub.generator(), &request).await;
        self.reply(frames::encode(
            frames::GENERATE_RESPONSE,
            id.as_ref(),
            GenerateResponseData::from(result),
        ));
    }

    async fn on_chat(&mut self, data: Value, id: Option<Value>) {
        let data: ChatMessageData = match serde_json::from_value(data) {
            Ok(data) => data,
            Err(err) => {
                self.reply(frames::error_frame(
                    frames::CHAT_MESSAGE,
                    &format!("invalid chat message: {err}"),
                ));
                return;
            }
        };

        if let Some(history) = data.history {
            self.history = history;
            cap_history(&mut self.history);
        }
        let snapshot = self.hub.snapshot();
        let reply = match self.hub.conversation().respond(&data.message, &snapshot, &self.history).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(client_id = %self.id, error = %err, "conversation failed");
                self.reply(frames::encode(
                    frames::CHAT_RESPONSE,
                    id.as_ref(),
                    ChatResponseData {
                        success: false,
                        content: String::new(),
                        ui_update: None,
                        applied: false,
                        view_state: None,
                        error: Some(err.to_string()),
                    },
                ));
                return;
            }
        };

        self.history.push(ChatTurn { role: ChatRole::User, content: data.message });
        self.history.push(ChatTurn { role: ChatRole::Assistant, content: reply.content.clone() });
        cap_history(&mut self.history);

        let mut response = ChatResponseData {
            success: true,
            content: reply.content,
            ui_update: reply.ui_update,
            applied: false,
            view_state: None,
            error: None,
        };

        if let Some(update) = &response.ui_update {
            let outcome = validate_ui_update(update)
                .map_err(|err| err.to_string())
                .and_then(|validated| {
                    self.hub.apply_ops(&[validated.op], Some(&self.id)).map_err(|err| err.to_string())
                });
            match outcome {
                Ok(committed) => {
                    response.applied = true;
                    response.view_state = Some(committed.view);
                }
                Err(reason) => {
                    warn!(client_id = %self.id, reason = %reason, "chat ui update rejected");
                    self.reply(frames::error_frame(frames::CHAT_MESSAGE, &reason));
                    response.error = Some(reason);
                }
            }
        }

        self.reply(frames::encode(frames::CHAT_RESPONSE, id.as_ref(), response));
    }
}

fn cap_history(history: &mut Vec<ChatTurn>) {
    let excess = history.len().saturating_sub(MAX_HISTORY_TURNS);
    history.drain(..excess);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turns(count: usize) -> Vec<ChatTurn> {
        (0..count).map(|n| ChatTurn { role: ChatRole::User, content: n.to_string() }).collect()
    }

    #[test]
    fn history_keeps_only_the_most_recent_turns() {
        let mut history = turns(MAX_HISTORY_TURNS + 6);
        cap_history(&mut history);
        assert_eq!(history.len(), MAX_HISTORY_TURNS);
        assert_eq!(history[0].content, "6");
        assert_eq!(history.last().map(|turn| turn.content.as_str()), Some("45"));

        let mut short = turns(3);
        cap_history(&mut short);
        assert_eq!(short, turns(3));
    }
}
