//! # Presence
//!
//! Live count of visitors with the site open.
//!
//! - Each browser tab holds a WebSocket on `/ws`
//! - Every join, leave or identify broadcasts `{ event: "user-count", count, timestamp }` to all tabs
//! - Tabs can send `{ event: "identify", data: {...} }` to attach details to their entry
use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        State as AxumState, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tokio::sync::broadcast::{self, Receiver, error::RecvError};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::State;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: Uuid,
    pub connected_at: DateTime<Utc>,
    #[serde(flatten)]
    pub identity: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename = "user-count")]
pub struct UserCount {
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
enum ClientEvent {
    Identify(Map<String, Value>),
}

pub struct Presence {
    peers: Mutex<HashMap<Uuid, Peer>>,
    events: broadcast::Sender<UserCount>,
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}

impl Presence {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            peers: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> Receiver<UserCount> {
        self.events.subscribe()
    }

    pub fn join(&self) -> Uuid {
        let id = Uuid::new_v4();
        let count = {
            let mut peers = self.peers.lock();
            peers.insert(
                id,
                Peer {
                    id,
                    connected_at: Utc::now(),
                    identity: Map::new(),
                },
            );
            peers.len()
        };

        info!("Visitor connected: {id}");
        self.emit(count);
        id
    }

    pub fn leave(&self, id: Uuid) {
        let count = {
            let mut peers = self.peers.lock();
            if peers.remove(&id).is_none() {
                return;
            }
            peers.len()
        };

        info!("Visitor disconnected: {id}");
        self.emit(count);
    }

    /// Merges client supplied fields into the peer entry, `id` and `connectedAt` stay ours.
    pub fn identify(&self, id: Uuid, data: Map<String, Value>) {
        let count = {
            let mut peers = self.peers.lock();
            let Some(peer) = peers.get_mut(&id) else {
                return;
            };

            peer.identity.extend(
                data.into_iter()
                    .filter(|(key, _)| key != "id" && key != "connectedAt"),
            );
            peers.len()
        };

        self.emit(count);
    }

    pub fn count(&self) -> usize {
        self.peers.lock().len()
    }

    pub fn peers(&self) -> Vec<Peer> {
        let mut peers: Vec<Peer> = self.peers.lock().values().cloned().collect();
        peers.sort_by_key(|peer| peer.connected_at);
        peers
    }

    fn emit(&self, count: usize) {
        // no receivers just means nobody is listening
        let _ = self.events.send(UserCount {
            count,
            timestamp: Utc::now(),
        });
    }

    fn handle_client_message(&self, id: Uuid, text: &str) {
        match serde_json::from_str::<ClientEvent>(text) {
            Ok(ClientEvent::Identify(data)) => self.identify(id, data),
            Err(e) => debug!("Ignoring message from {id}: {e}"),
        }
    }
}

pub async fn socket_handler(
    AxumState(state): AxumState<Arc<State>>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<State>) {
    let (mut sink, mut stream) = socket.split();
    let mut events = state.presence.subscribe();
    let mut shutdown = state.on_shutdown();

    let id = state.presence.join();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let Ok(text) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if sink.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!("Visitor {id} skipped {skipped} events"),
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => state.presence.handle_client_message(id, text.as_str()),
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
            _ = shutdown.changed() => break,
        }
    }

    state.presence.leave(id);
}
