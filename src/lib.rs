//! Railops - client library for the rail logistics operations dashboard.
//!
//! This crate provides the two pieces every dashboard consumer needs:
//!
//! - **Realtime core** - a persistent, topic-multiplexed socket client
//!   delivering push updates (rake positions, simulation events) to
//!   multiple independent subscribers. This is the interesting part; see
//!   [`realtime`].
//! - **REST wrapper** - a thin stateless client for the dashboard API
//!   (orders, rakes, inventory, metrics, simulation controls); see [`api`].
//!
//! # Modules
//!
//! - [`realtime`] - Connection manager, envelope, subscription registry
//! - [`api`] - HTTP client for the dashboard API
//! - [`config`] - Configuration loading/saving
//! - [`constants`] - Timeouts and endpoint defaults

pub mod api;
pub mod config;
pub mod constants;
pub mod realtime;

// Re-export commonly used types
pub use api::{ApiClient, ApiResponse, SimulationRake};
pub use config::Config;
pub use realtime::{Envelope, RealtimeClient, SessionState, SimulationAction, Subscription};
