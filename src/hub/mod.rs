// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Vibecanvas-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of vibecanvas and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! WebSocket connection hub.
//!
//! The client registry and the canvas live behind a single `RwLock`. Mutations take the
//! write lock, then downgrade it and fan the resulting frame out while still holding the
//! read half, so every client observes mutations in the order they were committed.
//! Fan-out never blocks: a client whose bounded queue is full is evicted.

mod connection;
pub mod frames;

#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::ws::Utf8Bytes;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::{RwLock, RwLockWriteGuard};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::collab::{CodeGenerator, ConversationalEngine, EchoConversation, ManifestGenerator};
use crate::config::{ConfigError, HubConfig};
use crate::model::{ClientId, ViewState};
use crate::ops::{self, ApplyError, ApplyResult, Op};

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("invalid hub configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },
    #[error("hub server error: {0}")]
    Serve(#[source] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HubStatus {
    Starting,
    Listening { addr: SocketAddr },
    Failed { reason: String },
    Stopped,
}

impl fmt::Display for HubStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => f.write_str("starting"),
            Self::Listening { addr } => write!(f, "listening on {addr}"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Stopped => f.write_str("stopped"),
        }
    }
}

/// What the upgrade path needs to drive one client: its id, the queue the writer drains,
/// and the signal that fires when the hub drops the client.
pub(crate) struct Registration {
    pub(crate) id: ClientId,
    pub(crate) outbound: mpsc::Receiver<Utf8Bytes>,
    pub(crate) closed: oneshot::Receiver<()>,
}

struct ClientHandle {
    outbound: mpsc::Sender<Utf8Bytes>,
    // Dropping this wakes the writer task.
    _close: oneshot::Sender<()>,
    connected_at: Instant,
}

#[derive(Default)]
struct Shared {
    clients: HashMap<ClientId, ClientHandle>,
    view: ViewState,
    rev: u64,
}

/// Outcome of a committed canvas mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    pub result: ApplyResult,
    pub view: ViewState,
    pub rev: u64,
    pub delivered: usize,
}

struct HubInner {
    config: HubConfig,
    shared: RwLock<Shared>,
    status: RwLock<HubStatus>,
    generator: Arc<dyn CodeGenerator>,
    conversation: Arc<dyn ConversationalEngine>,
    shutdown: watch::Sender<bool>,
    started_at: Instant,
}

#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

impl fmt::Debug for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("addr", &self.inner.config.addr())
            .field("status", &*self.inner.status.read())
            .field("clients", &self.client_count())
            .finish()
    }
}

impl Hub {
    pub fn new(config: HubConfig) -> Self {
        Self::with_collaborators(
            config,
            Arc::new(ManifestGenerator),
            Arc::new(EchoConversation),
        )
    }

    pub fn with_collaborators(
        config: HubConfig,
        generator: Arc<dyn CodeGenerator>,
        conversation: Arc<dyn ConversationalEngine>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            inner: Arc::new(HubInner {
                config,
                shared: RwLock::new(Shared::default()),
                status: RwLock::new(HubStatus::Starting),
                generator,
                conversation,
                shutdown,
                started_at: Instant::now(),
            }),
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.inner.config
    }

    pub fn generator(&self) -> &dyn CodeGenerator {
        self.inner.generator.as_ref()
    }

    pub fn conversation(&self) -> &dyn ConversationalEngine {
        self.inner.conversation.as_ref()
    }

    pub fn status(&self) -> HubStatus {
        self.inner.status.read().clone()
    }

    fn set_status(&self, status: HubStatus) {
        debug!(status = %status, "hub status changed");
        *self.inner.status.write() = status;
    }

    /// The bound address once listening; otherwise the configured one.
    pub fn local_addr(&self) -> SocketAddr {
        match &*self.inner.status.read() {
            HubStatus::Listening { addr } => *addr,
            _ => self.inner.config.addr(),
        }
    }

    pub fn uptime(&self) -> Duration {
        self.inner.started_at.elapsed()
    }

    pub fn snapshot(&self) -> ViewState {
        self.inner.shared.read().view.clone()
    }

    pub fn rev(&self) -> u64 {
        self.inner.shared.read().rev
    }

    pub fn client_count(&self) -> usize {
        self.inner.shared.read().clients.len()
    }

    pub fn is_registered(&self, id: &ClientId) -> bool {
        self.inner.shared.read().clients.contains_key(id)
    }

    /// Registers a new client and queues the current canvas as its first frame.
    ///
    /// The replay is enqueued under the same write lock that inserts the client, so no
    /// broadcast can slip in ahead of it.
    pub(crate) fn register(&self) -> Registration {
        let (outbound_tx, outbound) = mpsc::channel(self.inner.config.queue_capacity.max(1));
        let (close, closed) = oneshot::channel();
        let id = ClientId::generate();

        let mut shared = self.inner.shared.write();
        if outbound_tx.try_send(frames::view_update(&shared.view)).is_err() {
            warn!(client_id = %id, "failed to queue replay frame");
        }
        shared.clients.insert(
            id.clone(),
            ClientHandle { outbound: outbound_tx, _close: close, connected_at: Instant::now() },
        );
        let clients = shared.clients.len();
        drop(shared);

        info!(client_id = %id, clients, "client connected");
        Registration { id, outbound, closed }
    }

    pub(crate) fn deregister(&self, id: &ClientId) {
        let removed = self.inner.shared.write().clients.remove(id);
        if let Some(handle) = removed {
            info!(
                client_id = %id,
                connected_for_ms = handle.connected_at.elapsed().as_millis() as u64,
                "client disconnected"
            );
        }
    }

    /// Queues `frame` for every client except `origin`. Returns the number of clients
    /// that accepted it.
    pub fn broadcast(&self, frame: Utf8Bytes, origin: Option<&ClientId>) -> usize {
        let shared = self.inner.shared.read();
        let (delivered, stale) = fan_out(&shared.clients, &frame, origin);
        drop(shared);
        self.evict(stale);
        delivered
    }

    /// Queues `frame` for a single client. A saturated client is evicted.
    pub fn send_to(&self, id: &ClientId, frame: Utf8Bytes) -> bool {
        let shared = self.inner.shared.read();
        let Some(handle) = shared.clients.get(id) else {
            return false;
        };
        let sent = handle.outbound.try_send(frame).is_ok();
        drop(shared);
        if !sent {
            self.evict(vec![id.clone()]);
        }
        sent
    }

    /// Swaps the whole canvas (last writer wins) and forwards `frame` to everyone but
    /// `origin`.
    pub fn replace_view(&self, view: ViewState, frame: Utf8Bytes, origin: Option<&ClientId>) -> usize {
        let mut shared = self.inner.shared.write();
        shared.view = view;
        shared.rev += 1;
        let rev = shared.rev;
        let shared = RwLockWriteGuard::downgrade(shared);
        let (delivered, stale) = fan_out(&shared.clients, &frame, origin);
        drop(shared);
        debug!(rev, delivered, "view replaced");
        self.evict(stale);
        delivered
    }

    /// Applies `ops` atomically and broadcasts the resulting canvas to everyone but
    /// `origin`. Nothing is committed or sent when any op fails.
    pub fn apply_ops(&self, ops: &[Op], origin: Option<&ClientId>) -> Result<Committed, ApplyError> {
        let mut shared = self.inner.shared.write();
        let result = ops::apply_ops(&mut shared.view, ops)?;
        shared.rev += 1;
        let rev = shared.rev;
        let view = shared.view.clone();
        let frame = frames::view_update(&view);
        let shared = RwLockWriteGuard::downgrade(shared);
        let (delivered, stale) = fan_out(&shared.clients, &frame, origin);
        drop(shared);
        debug!(rev, applied = result.applied, delivered, "ops committed");
        self.evict(stale);
        Ok(Committed { result, view, rev, delivered })
    }

    fn evict(&self, ids: Vec<ClientId>) {
        if ids.is_empty() {
            return;
        }
        let mut shared = self.inner.shared.write();
        for id in ids {
            if shared.clients.remove(&id).is_some() {
                warn!(client_id = %id, "evicted slow or closed client");
            }
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/ws", get(ws_upgrade))
            .route("/health", get(health))
            .route("/state", get(current_state))
            .with_state(self.clone())
    }

    /// Serves on an already bound listener until [`Hub::shutdown`] is called.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), HubError> {
        let addr = listener.local_addr().map_err(HubError::Serve)?;
        self.set_status(HubStatus::Listening { addr });
        info!(%addr, "hub listening");

        let mut stop = self.inner.shutdown.subscribe();
        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = stop.wait_for(|stopped| *stopped).await;
            })
            .await;

        self.set_status(HubStatus::Stopped);
        served.map_err(HubError::Serve)
    }

    pub async fn bind_and_serve(&self) -> Result<(), HubError> {
        if let Err(err) = self.inner.config.validate() {
            self.set_status(HubStatus::Failed { reason: err.to_string() });
            return Err(err.into());
        }
        let addr = self.inner.config.addr();
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(source) => {
                self.set_status(HubStatus::Failed { reason: source.to_string() });
                return Err(HubError::Bind { addr, source });
            }
        };
        self.serve(listener).await
    }

    /// Starts [`Hub::bind_and_serve`] in the background. Failures land in [`Hub::status`].
    pub fn spawn(&self) -> JoinHandle<()> {
        let hub = self.clone();
        tokio::spawn(async move {
            if let Err(err) = hub.bind_and_serve().await {
                error!(error = %err, "hub stopped with an error");
            }
        })
    }

    /// Stops accepting connections and drops every client.
    pub fn shutdown(&self) {
        self.inner.shutdown.send_replace(true);
        let clients: Vec<ClientId> = self.inner.shared.write().clients.drain().map(|(id, _)| id).collect();
        info!(clients = clients.len(), "hub shutting down");
    }
}

fn fan_out(
    clients: &HashMap<ClientId, ClientHandle>,
    frame: &Utf8Bytes,
    origin: Option<&ClientId>,
) -> (usize, Vec<ClientId>) {
    let mut delivered = 0;
    let mut stale = Vec::new();
    for (id, handle) in clients {
        if Some(id) == origin {
            continue;
        }
        match handle.outbound.try_send(frame.clone()) {
            Ok(()) => delivered += 1,
            Err(_) => stale.push(id.clone()),
        }
    }
    (delivered, stale)
}

async fn ws_upgrade(State(hub): State<Hub>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| connection::run(hub, socket))
}

async fn health(State(hub): State<Hub>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "clients": hub.client_count(),
        "rev": hub.rev(),
        "uptime_secs": hub.uptime().as_secs(),
    }))
}

async fn current_state(State(hub): State<Hub>) -> Json<ViewState> {
    Json(hub.snapshot())
}
