//! Per-workspace registry of live WebSocket connections.
//!
//! Each connection owns a bounded outbound queue drained by its writer task.
//! The registry holds the only sender of every queue, so dropping a
//! connection closes its queue and the writer ends the socket.
//! Broadcasting never awaits a socket: a connection whose queue is closed or
//! full is dropped from the registry and the rest still receive the payload.
//! Registration, removal and broadcast serialize per workspace; different
//! workspaces only share the outer read lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use frontdesk_tickets::InboxEvent;
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, warn};

type Connections = Arc<Mutex<Vec<Registered>>>;

/// Handle of one registered socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    id: u64,
    workspace_id: String,
}

impl Connection {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }
}

struct Registered {
    id: u64,
    sender: mpsc::Sender<String>,
}

#[derive(Clone)]
pub struct ConnectionRegistry {
    workspaces: Arc<RwLock<HashMap<String, Connections>>>,
    next_id: Arc<AtomicU64>,
    buffer: usize,
}

impl ConnectionRegistry {
    pub fn new(buffer: usize) -> Self {
        Self {
            workspaces: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            buffer: buffer.max(1),
        }
    }

    /// Add a connection under `workspace_id`. The receiver yields every
    /// payload broadcast to that workspace and ends once the connection is
    /// removed.
    pub async fn register(&self, workspace_id: &str) -> (Connection, mpsc::Receiver<String>) {
        let (sender, receiver) = mpsc::channel(self.buffer);
        let connection = Connection {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            workspace_id: workspace_id.to_string(),
        };

        let mut workspaces = self.workspaces.write().await;
        let connections = workspaces.entry(workspace_id.to_string()).or_default();
        connections.lock().await.push(Registered {
            id: connection.id,
            sender,
        });

        debug!(workspace_id, connection_id = connection.id, "connection registered");
        (connection, receiver)
    }

    /// Deregister `connection`. Removing twice is a no-op.
    pub async fn remove(&self, connection: &Connection) {
        let mut workspaces = self.workspaces.write().await;
        let Some(connections) = workspaces.get(&connection.workspace_id) else {
            return;
        };

        let now_empty = {
            let mut connections = connections.lock().await;
            connections.retain(|existing| existing.id != connection.id);
            connections.is_empty()
        };
        if now_empty {
            workspaces.remove(&connection.workspace_id);
        }

        debug!(
            workspace_id = %connection.workspace_id,
            connection_id = connection.id,
            "connection removed"
        );
    }

    /// Queue `payload` for one connection only. A connection that cannot
    /// take it is dropped like in [`send_to_all`](Self::send_to_all).
    pub async fn send_to(&self, connection: &Connection, payload: String) -> bool {
        let delivered = {
            let workspaces = self.workspaces.read().await;
            let Some(connections) = workspaces.get(&connection.workspace_id) else {
                return false;
            };

            let mut connections = connections.lock().await;
            let Some(position) = connections.iter().position(|entry| entry.id == connection.id)
            else {
                return false;
            };

            match connections[position].sender.try_send(payload) {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        workspace_id = %connection.workspace_id,
                        connection_id = connection.id,
                        error = %err,
                        "dropping connection after failed send"
                    );
                    connections.remove(position);
                    false
                }
            }
        };

        if !delivered {
            self.prune(&connection.workspace_id).await;
        }
        delivered
    }

    /// Queue `payload` on every connection of `workspace_id` and return how
    /// many accepted it.
    pub async fn send_to_all(&self, workspace_id: &str, payload: &str) -> usize {
        let delivered = {
            let workspaces = self.workspaces.read().await;
            let Some(connections) = workspaces.get(workspace_id) else {
                return 0;
            };

            let mut connections = connections.lock().await;
            connections.retain(|entry| match entry.sender.try_send(payload.to_string()) {
                Ok(()) => true,
                Err(err) => {
                    warn!(
                        workspace_id,
                        connection_id = entry.id,
                        error = %err,
                        "dropping connection after failed send"
                    );
                    false
                }
            });
            connections.len()
        };

        if delivered == 0 {
            self.prune(workspace_id).await;
        }
        delivered
    }

    /// Serialize `event` and fan it out to `workspace_id`.
    pub async fn broadcast(&self, workspace_id: &str, event: &InboxEvent) -> usize {
        match event.to_json() {
            Ok(payload) => self.send_to_all(workspace_id, &payload).await,
            Err(err) => {
                error!(
                    workspace_id,
                    kind = event.kind.as_str(),
                    error = %err,
                    "failed to serialize inbox event"
                );
                0
            }
        }
    }

    async fn prune(&self, workspace_id: &str) {
        let mut workspaces = self.workspaces.write().await;
        let now_empty = match workspaces.get(workspace_id) {
            Some(connections) => connections.lock().await.is_empty(),
            None => false,
        };
        if now_empty {
            workspaces.remove(workspace_id);
        }
    }

    pub async fn connection_count(&self, workspace_id: &str) -> usize {
        let workspaces = self.workspaces.read().await;
        let count = match workspaces.get(workspace_id) {
            Some(connections) => connections.lock().await.len(),
            None => 0,
        };
        count
    }
}
