use crate::registry::{ConnectionId, ConnectionRegistry, Enqueue, SessionHandle};
use crate::{HubConfig, Payload, RecipientId};
use log::*;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};

/// Control messages consumed by the dispatch loop, in arrival order.
#[derive(Debug)]
pub(crate) enum Command {
    Register(SessionHandle),
    Unregister {
        recipient_id: RecipientId,
        connection_id: ConnectionId,
    },
    Broadcast {
        recipient_id: RecipientId,
        payload: Payload,
    },
    ConnectionCount {
        recipient_id: RecipientId,
        reply: oneshot::Sender<usize>,
    },
    Stats {
        reply: oneshot::Sender<HubStats>,
    },
}

/// Point-in-time view of the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubStats {
    pub connected_recipients: usize,
    pub connections: usize,
}

/// Handle used by request handlers, sessions and services to talk to the
/// dispatch loop. Cloning is cheap; the loop stops once every handle is gone.
#[derive(Debug, Clone)]
pub struct Hub {
    commands: mpsc::Sender<Command>,
}

/// Builds a connected `Hub` handle and the `DispatchLoop` that serves it.
/// The loop must be spawned by the caller.
pub fn channel(config: &HubConfig) -> (Hub, DispatchLoop) {
    let (tx, rx) = mpsc::channel(config.dispatch_queue_capacity);
    (
        Hub { commands: tx },
        DispatchLoop {
            commands: rx,
            registry: ConnectionRegistry::new(),
        },
    )
}

impl Hub {
    /// Add a session to the registry. Fails only when the dispatch loop has
    /// stopped, in which case the caller should abort the connection.
    pub async fn register(&self, handle: SessionHandle) -> Result<(), HubClosed> {
        self.commands
            .send(Command::Register(handle))
            .await
            .map_err(|_| HubClosed)
    }

    pub async fn unregister(&self, recipient_id: RecipientId, connection_id: ConnectionId) {
        let command = Command::Unregister {
            recipient_id,
            connection_id,
        };
        if self.commands.send(command).await.is_err() {
            debug!("Dispatch loop stopped before connection {connection_id} was unregistered");
        }
    }

    /// Queue a payload for every live session of `recipient_id`.
    /// Best effort: waits only for control channel capacity and never fails.
    pub async fn broadcast(&self, recipient_id: RecipientId, payload: impl Into<Payload>) {
        let command = Command::Broadcast {
            recipient_id,
            payload: payload.into(),
        };
        if self.commands.send(command).await.is_err() {
            warn!("Dispatch loop is not running, dropping notification for {recipient_id}");
        }
    }

    pub async fn connection_count(&self, recipient_id: RecipientId) -> usize {
        let (reply, rx) = oneshot::channel();
        let command = Command::ConnectionCount {
            recipient_id,
            reply,
        };
        if self.commands.send(command).await.is_err() {
            return 0;
        }
        rx.await.unwrap_or_default()
    }

    pub async fn stats(&self) -> HubStats {
        let (reply, rx) = oneshot::channel();
        if self.commands.send(Command::Stats { reply }).await.is_err() {
            return HubStats::default();
        }
        rx.await.unwrap_or_default()
    }
}

/// Returned when the dispatch loop is no longer consuming commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HubClosed;

impl std::fmt::Display for HubClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dispatch loop is not running")
    }
}

impl std::error::Error for HubClosed {}

/// The single consumer of hub commands and sole owner of the registry.
pub struct DispatchLoop {
    commands: mpsc::Receiver<Command>,
    registry: ConnectionRegistry,
}

impl DispatchLoop {
    /// Process commands until every `Hub` handle has been dropped.
    pub async fn run(mut self) {
        info!("Notification dispatch loop started");

        while let Some(command) = self.commands.recv().await {
            self.handle(command);
        }

        info!(
            "Notification dispatch loop stopped, dropping {} live connection(s)",
            self.registry.total_connections()
        );
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Register(handle) => {
                let recipient_id = handle.recipient_id;
                let connection_id = handle.id;
                self.registry.register(handle);
                info!(
                    "Registered connection {connection_id} for user {recipient_id} ({} active)",
                    self.registry.connection_count(&recipient_id)
                );
            }
            Command::Unregister {
                recipient_id,
                connection_id,
            } => {
                if self.registry.unregister(&recipient_id, &connection_id) {
                    info!(
                        "Unregistered connection {connection_id} for user {recipient_id} ({} remaining)",
                        self.registry.connection_count(&recipient_id)
                    );
                }
            }
            Command::Broadcast {
                recipient_id,
                payload,
            } => self.broadcast(recipient_id, payload),
            Command::ConnectionCount {
                recipient_id,
                reply,
            } => {
                let _ = reply.send(self.registry.connection_count(&recipient_id));
            }
            Command::Stats { reply } => {
                let _ = reply.send(HubStats {
                    connected_recipients: self.registry.recipient_count(),
                    connections: self.registry.total_connections(),
                });
            }
        }
    }

    fn broadcast(&mut self, recipient_id: RecipientId, payload: Payload) {
        let sessions = self.registry.sessions_for(&recipient_id);
        if sessions.is_empty() {
            debug!("No live connections for user {recipient_id}, notification not pushed");
            return;
        }

        for session in sessions {
            match session.try_enqueue(&payload) {
                Enqueue::Queued => {}
                Enqueue::Full => {
                    warn!(
                        "Outbound queue full for connection {}, evicting slow consumer",
                        session.id
                    );
                    self.registry.unregister(&recipient_id, &session.id);
                }
                Enqueue::Closed => {
                    debug!("Connection {} already closed, removing", session.id);
                    self.registry.unregister(&recipient_id, &session.id);
                }
            }
        }

        trace!("Broadcast to user {recipient_id} complete");
    }
}
