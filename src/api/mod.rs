//! REST client for the dashboard server API.
//!
//! A thin stateless request/response wrapper, entirely independent of the
//! realtime core: it shares no state with [`crate::realtime`] and makes no
//! assumption about connection lifecycle. Every response arrives in the
//! server's standard `{data, message?, success}` wrapper.
//!
//! # Modules
//!
//! - [`client`] - HTTP client for the dashboard API
//! - [`types`] - Response wrapper and typed payloads

pub mod client;
pub mod types;

pub use client::ApiClient;
pub use types::{ApiResponse, SimulationRake};
