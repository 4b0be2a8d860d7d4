//! Application-wide constants for railops.
//!
//! Centralizes timeouts and endpoint defaults so they are discoverable in
//! one place rather than scattered as magic numbers.

use std::time::Duration;

/// Default WebSocket endpoint of the dashboard server.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";

/// Default base URL of the dashboard REST API.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Default heartbeat cadence.
///
/// The server treats a quiet connection as live as long as pings keep
/// arriving; 30 seconds matches what the dashboard server expects.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// HTTP client request timeout for REST API calls.
///
/// Applies per request. Long enough for the slower aggregate endpoints
/// (dashboard metrics), short enough to avoid indefinite hangs.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
