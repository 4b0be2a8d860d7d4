//! Realtime connection manager for the dashboard push channel.
//!
//! This module owns the one component of the client with genuine moving
//! parts: a persistent, topic-multiplexed socket client that delivers push
//! updates (rake positions, simulation events) to multiple independent
//! subscribers without transport details leaking into consumer code.
//!
//! # Architecture
//!
//! ```text
//! RealtimeClient
//!     ├── Session (at most one; Idle → Connecting → Open → Closed)
//!     │   └── TransportSession + event pump task
//!     ├── SubscriptionRegistry (topic → ordered handlers, "*" wildcard)
//!     └── Heartbeat task (at most one; explicit opt-in)
//! ```
//!
//! The manager never reconnects on its own: every session end, expected or
//! not, is surfaced once through the `on_close` callback and the caller
//! layers retry policy on top. Subscriptions live in the registry, not the
//! session, so they survive a caller-driven reconnect.
//!
//! # Modules
//!
//! - [`client`] - The connection manager itself
//! - [`envelope`] - Flattened wire envelope and well-known topics
//! - [`registry`] - Ordered topic subscription registry
//! - [`transport`] - Transport seam (trait + tokio-tungstenite impl)

pub mod client;
pub mod envelope;
pub mod registry;
pub mod transport;

use std::sync::{Arc, RwLock};

/// Lifecycle of one transport session.
///
/// `Closed` is terminal for that session only; a later `connect` produces a
/// brand-new session and re-enters `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No session has ever been opened.
    #[default]
    Idle,
    /// Transport constructed, handshake in flight.
    Connecting,
    /// Handshake complete; sends are accepted.
    Open,
    /// The session ended (explicit disconnect or transport failure).
    Closed,
}

/// Session state shared between the manager, its background tasks, and
/// external observers.
#[derive(Debug, Default)]
pub struct SharedSessionState {
    state: RwLock<SessionState>,
}

impl SharedSessionState {
    /// Create new shared state, starting at [`SessionState::Idle`].
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get the current state.
    pub fn get(&self) -> SessionState {
        *self.state.read().expect("state lock poisoned")
    }

    /// Set the state.
    pub(crate) fn set(&self, new_state: SessionState) {
        *self.state.write().expect("state lock poisoned") = new_state;
    }

    /// Check whether sends would currently be accepted.
    pub fn is_open(&self) -> bool {
        self.get() == SessionState::Open
    }
}

// Re-exports
pub use client::{LifecycleCallback, RealtimeClient, SimulationAction};
pub use envelope::{topics, Envelope};
pub use registry::{Handler, Subscription, SubscriptionRegistry};
pub use transport::{Connector, TransportError, TransportEvent, TransportSession, WsConnector};
