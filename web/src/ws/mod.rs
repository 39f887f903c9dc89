//! WebSocket upgrade for the notification stream.
//!
//! Only the Axum handler lives here. Sessions, the registry and the dispatch
//! loop belong to the `hub` crate.

pub(crate) mod handler;
