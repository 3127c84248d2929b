//! WebSocket layer: connection handling, message routing, subscriptions.
//!
//! The WebSocket endpoint at `/ws` streams committed pool events to
//! clients, filtered per connection by the caller that triggered them,
//! and answers `get_state` queries.

pub mod connection;
pub mod handler;
pub mod messages;
pub mod subscription;
