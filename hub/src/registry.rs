use log::*;
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc::Sender;

use crate::{Payload, RecipientId};

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(uuid::Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The registry's view of a live session: who it belongs to and the
/// producer end of its outbound queue.
///
/// The registry holds the only `Sender` for a session's queue, so removing
/// the handle from the registry closes the queue and lets the session's
/// outbound pump wind down.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    pub id: ConnectionId,
    pub recipient_id: RecipientId,
    pub(crate) outbound: Sender<Payload>,
}

/// Outcome of a single non-blocking enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Enqueue {
    Queued,
    Full,
    Closed,
}

impl SessionHandle {
    pub(crate) fn try_enqueue(&self, payload: &Payload) -> Enqueue {
        use tokio::sync::mpsc::error::TrySendError;

        match self.outbound.try_send(payload.clone()) {
            Ok(()) => Enqueue::Queued,
            Err(TrySendError::Full(_)) => Enqueue::Full,
            Err(TrySendError::Closed(_)) => Enqueue::Closed,
        }
    }
}

/// Bookkeeping of which sessions belong to which recipient.
///
/// Owned by the dispatch loop; nothing else holds a reference to it, so it
/// needs no interior locking.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    recipients: HashMap<RecipientId, HashMap<ConnectionId, SessionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its recipient. Re-registering the same
    /// connection id replaces the entry rather than duplicating it.
    pub fn register(&mut self, handle: SessionHandle) {
        let sessions = self.recipients.entry(handle.recipient_id).or_default();
        if sessions.insert(handle.id, handle).is_some() {
            warn!("Connection registered twice, previous entry replaced");
        }
    }

    /// Remove a session. Returns `false` when it was not registered, which
    /// makes repeated unregisters harmless.
    pub fn unregister(&mut self, recipient_id: &RecipientId, connection_id: &ConnectionId) -> bool {
        let Some(sessions) = self.recipients.get_mut(recipient_id) else {
            return false;
        };

        // Dropping the handle drops the queue's only sender.
        let removed = sessions.remove(connection_id).is_some();

        if sessions.is_empty() {
            self.recipients.remove(recipient_id);
        }

        removed
    }

    /// Snapshot of a recipient's sessions at the time of the call.
    pub fn sessions_for(&self, recipient_id: &RecipientId) -> Vec<SessionHandle> {
        self.recipients
            .get(recipient_id)
            .map(|sessions| sessions.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn connection_count(&self, recipient_id: &RecipientId) -> usize {
        self.recipients.get(recipient_id).map_or(0, HashMap::len)
    }

    pub fn recipient_count(&self) -> usize {
        self.recipients.len()
    }

    pub fn total_connections(&self) -> usize {
        self.recipients.values().map(HashMap::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn handle(recipient_id: RecipientId) -> (SessionHandle, mpsc::Receiver<Payload>) {
        let (tx, rx) = mpsc::channel(4);
        (
            SessionHandle {
                id: ConnectionId::new(),
                recipient_id,
                outbound: tx,
            },
            rx,
        )
    }

    #[test]
    fn register_twice_keeps_a_single_entry() {
        let mut registry = ConnectionRegistry::new();
        let recipient = RecipientId::new_v4();
        let (session, _rx) = handle(recipient);

        registry.register(session.clone());
        registry.register(session.clone());

        assert_eq!(registry.connection_count(&recipient), 1);
        assert_eq!(registry.sessions_for(&recipient).len(), 1);
    }

    #[test]
    fn unregister_last_session_prunes_recipient_entry() {
        let mut registry = ConnectionRegistry::new();
        let recipient = RecipientId::new_v4();
        let (first, _rx1) = handle(recipient);
        let (second, _rx2) = handle(recipient);

        registry.register(first.clone());
        registry.register(second.clone());
        assert_eq!(registry.recipient_count(), 1);

        assert!(registry.unregister(&recipient, &first.id));
        assert_eq!(registry.connection_count(&recipient), 1);

        assert!(registry.unregister(&recipient, &second.id));
        assert_eq!(registry.recipient_count(), 0);
        assert!(registry.sessions_for(&recipient).is_empty());
    }

    #[test]
    fn unregister_is_a_no_op_once_removed() {
        let mut registry = ConnectionRegistry::new();
        let recipient = RecipientId::new_v4();
        let (session, _rx) = handle(recipient);

        registry.register(session.clone());
        assert!(registry.unregister(&recipient, &session.id));
        assert!(!registry.unregister(&recipient, &session.id));
        assert_eq!(registry.recipient_count(), 0);
    }

    #[tokio::test]
    async fn unregister_closes_the_outbound_queue() {
        let mut registry = ConnectionRegistry::new();
        let recipient = RecipientId::new_v4();
        let (session, mut rx) = handle(recipient);
        let id = session.id;

        registry.register(session);
        registry.unregister(&recipient, &id);

        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn snapshot_is_unaffected_by_later_mutation() {
        let mut registry = ConnectionRegistry::new();
        let recipient = RecipientId::new_v4();
        let (session, _rx) = handle(recipient);

        registry.register(session.clone());
        let snapshot = registry.sessions_for(&recipient);
        registry.unregister(&recipient, &session.id);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, session.id);
    }

    #[test]
    fn sessions_are_kept_per_recipient() {
        let mut registry = ConnectionRegistry::new();
        let alice = RecipientId::new_v4();
        let bob = RecipientId::new_v4();
        let (a, _rx1) = handle(alice);
        let (b1, _rx2) = handle(bob);
        let (b2, _rx3) = handle(bob);

        registry.register(a);
        registry.register(b1);
        registry.register(b2);

        assert_eq!(registry.connection_count(&alice), 1);
        assert_eq!(registry.connection_count(&bob), 2);
        assert_eq!(registry.total_connections(), 3);
        assert_eq!(registry.recipient_count(), 2);
    }
}
