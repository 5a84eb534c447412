//! # Table Events Library
//!
//! Client for the poker event server: one WebSocket connection carrying
//! per-table subscriptions of pushed game events.
//!
//! ## Modules
//! - [`client`]: Connection management and subscriptions.
//! - [`protocol`]: JSON messages on the wire.
//! - [`listener`]: Handler-driven consumption of a single table.

/// Error types for the event client.
pub mod error;

/// The `protocol` module defines the client and server messages and parses
/// multi-line text frames.
pub mod protocol;

/// The `client` module owns the WebSocket connection and fans incoming events
/// out to subscribers by table id.
pub mod client;

/// Table listener.
pub mod listener;

pub use client::{EventClient, EventClientConfig, Subscription, SubscriptionHandle};
pub use error::{Error, Result};
pub use listener::{TableEventHandler, TableListener};
pub use protocol::{EventKind, TableEvent};
