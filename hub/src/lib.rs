//! Real-time notification fan-out over long-lived WebSocket connections.
//!
//! This crate owns every live streaming connection in the process and pushes
//! already-serialized notification payloads to them. It knows nothing about
//! what a notification is; the domain layer hands it `(recipient, payload)`
//! pairs and it does the routing.
//!
//! # Architecture
//!
//! - **Dispatch loop**: a single task that consumes one bounded control
//!   channel. Register, unregister and broadcast requests are applied in
//!   arrival order, so the registry needs no locking at all.
//! - **Connection registry**: recipient id to that recipient's live sessions.
//!   Owned exclusively by the dispatch loop.
//! - **Sessions**: one per connection, many per recipient (multi-device,
//!   multi-tab). Each has a bounded outbound queue and two pumps.
//! - **Slow-consumer eviction**: a broadcast never waits on a session. If a
//!   session's queue is full it is dropped from the registry and its queue
//!   closed; the client reconnects and catches up through the list endpoint.
//!
//! # Message Flow
//!
//! 1. The web layer upgrades a request for an authenticated user, builds a
//!    [`Session`] and registers its [`SessionHandle`] through the [`Hub`]
//! 2. The domain layer persists a notification and calls [`Hub::broadcast`]
//! 3. The dispatch loop snapshots the recipient's sessions and `try_send`s
//!    the payload onto each queue
//! 4. Each session's outbound pump writes the payload, coalescing anything
//!    queued behind it into the same newline-delimited frame
//!
//! Delivery is best effort. Nothing here is persisted, and shutting the
//! process down drops every connection.
//!
//! # Modules
//!
//! - `registry`: ConnectionRegistry, ConnectionId and SessionHandle
//! - `dispatch`: the Hub handle and the DispatchLoop that serves it
//! - `session`: per-connection outbound and inbound pumps

use std::sync::Arc;
use std::time::Duration;

pub mod dispatch;
pub mod registry;
pub mod session;

pub use dispatch::{channel, DispatchLoop, Hub, HubClosed, HubStats};
pub use registry::{ConnectionId, ConnectionRegistry, SessionHandle};
pub use session::{Session, SessionEnd};

/// The frame type sessions read and write.
pub use axum::extract::ws::Message;

/// Recipients are addressed by user id.
pub type RecipientId = uuid::Uuid;

/// A serialized payload, shared by every session it is queued on.
pub type Payload = Arc<str>;

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Capacity of the control channel into the dispatch loop.
    pub dispatch_queue_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            dispatch_queue_capacity: 256,
        }
    }
}

/// Per-connection timing and sizing.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub outbound_queue_capacity: usize,
    /// How often a ping is written. Must be shorter than `pong_wait`.
    pub ping_interval: Duration,
    /// Longest silence tolerated from the peer.
    pub pong_wait: Duration,
    /// Deadline for a single frame write.
    pub write_wait: Duration,
    pub max_message_bytes: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            outbound_queue_capacity: 256,
            ping_interval: Duration::from_secs(54),
            pong_wait: Duration::from_secs(60),
            write_wait: Duration::from_secs(10),
            max_message_bytes: 512,
        }
    }
}
