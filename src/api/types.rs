//! Request/response data types for the dashboard REST API.
//!
//! Only the payloads consumers actually pick fields out of are typed;
//! everything else stays `serde_json::Value` because the server owns those
//! shapes and the UI does its own field-mapping and defaulting.

use serde::{Deserialize, Serialize};

/// Standard response wrapper used by every dashboard endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    /// The endpoint's payload.
    pub data: T,
    /// Optional human-readable note from the server.
    #[serde(default)]
    pub message: Option<String>,
    /// Whether the server considers the operation successful.
    pub success: bool,
}

/// One rake as reported by the simulation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationRake {
    /// Rake identifier (e.g. "R1").
    pub id: String,
    /// Origin station code.
    pub from: String,
    /// Destination station code.
    pub to: String,
    /// Route progress, 0–100.
    pub progress: f64,
    /// Status label (e.g. "in_transit", "loading").
    pub status: String,
    /// Departure timestamp, if the rake has left.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    /// Estimated arrival, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
}
