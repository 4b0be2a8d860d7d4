//! Wire envelope for the dashboard socket protocol.
//!
//! Every frame on the wire is one flattened JSON object: a `type` field
//! carrying the topic, with the payload fields merged in as siblings
//! (not nested). `{"type":"position_update","rakeId":"R1","progress":42}`
//! is an envelope with topic `position_update` and a two-field payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Well-known topic names shared with the dashboard server.
pub mod topics {
    /// Reserved topic delivering every inbound envelope unfiltered.
    pub const WILDCARD: &str = "*";
    /// Outbound heartbeat.
    pub const PING: &str = "ping";
    /// Ask the server to push current rake positions.
    pub const REQUEST_POSITIONS: &str = "request_positions";
    /// Inbound rake position push.
    pub const POSITION_UPDATE: &str = "position_update";
    /// Notify the server of a simulation event for a rake.
    pub const SIMULATION_EVENT: &str = "simulation_event";
    /// Pause/resume/stop the server-side simulation.
    pub const SIMULATION_CONTROL: &str = "simulation_control";
}

/// One routed message unit: a topic plus an open payload map.
///
/// Serialization flattens the payload alongside the `type` discriminator,
/// matching the server's wire format exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Routing discriminator (`type` on the wire).
    #[serde(rename = "type")]
    pub topic: String,
    /// Payload fields, merged next to `type` at the wire level.
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    /// Create an envelope with an empty payload.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            payload: Map::new(),
        }
    }

    /// Create an envelope carrying the given payload fields.
    pub fn with_payload(topic: impl Into<String>, payload: Map<String, Value>) -> Self {
        Self {
            topic: topic.into(),
            payload,
        }
    }

    /// Parse one raw text frame.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if the frame is not a JSON object with
    /// a string `type` field. Callers log and drop such frames.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serialize to the flattened wire representation.
    ///
    /// # Errors
    ///
    /// Returns a `serde_json` error if a payload value cannot be serialized.
    pub fn to_wire(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// The complete envelope as a JSON object, `type` field included.
    ///
    /// This is what wildcard subscribers receive.
    pub fn full_object(&self) -> Value {
        let mut object = self.payload.clone();
        object.insert("type".to_string(), Value::String(self.topic.clone()));
        Value::Object(object)
    }

    /// The payload as a JSON object with the `type` field stripped.
    ///
    /// This is what topic-specific subscribers receive.
    pub fn payload_object(&self) -> Value {
        Value::Object(self.payload.clone())
    }
}
