//! Engine.IO v4 / Socket.IO v5 text framing over the WebSocket transport.
//!
//! The platform serves a Socket.IO endpoint. Rather than pulling in a full
//! Socket.IO client, the session speaks the handful of text frames it needs
//! directly:
//!
//! ```text
//! Engine.IO packet:  <type digit><payload>
//!   0 open  1 close  2 ping  3 pong  4 message  5 upgrade  6 noop
//!
//! Socket.IO packet (inside an Engine.IO "4" message):
//!   <type digit>[/namespace,][ack id]<json>
//!   0 connect  1 disconnect  2 event  3 ack  4 connect_error
//! ```
//!
//! So an event on the default namespace looks like
//! `42["status",{"robot_state":{...}}]`.
//!
//! Protocol reference: <https://socket.io/docs/v4/socket-io-protocol/>

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};

use roverdeck_core::prelude::*;
use roverdeck_core::{AutonomyLevel, CommandAck, InboundEvent, OutboundMessage, RobotStatus};

/// Query string appended to the `/socket.io/` path for a pure WebSocket
/// session (no HTTP long-polling upgrade dance).
pub const WEBSOCKET_QUERY: &str = "EIO=4&transport=websocket";

// ---------------------------------------------------------------------------
// Engine.IO
// ---------------------------------------------------------------------------

/// Payload of the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenPayload {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    /// Server ping interval in milliseconds.
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,
    /// How long the server waits for a pong, in milliseconds.
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

fn default_ping_interval() -> u64 {
    25_000
}

fn default_ping_timeout() -> u64 {
    20_000
}

impl OpenPayload {
    /// How long we may go without any server frame before declaring the
    /// transport dead.
    pub fn heartbeat_deadline(&self) -> Duration {
        Duration::from_millis(self.ping_interval.saturating_add(self.ping_timeout))
    }
}

/// A decoded Engine.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenPayload),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// A decoded Socket.IO packet.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Namespace connected (server → client carries `{sid}`)
    Connect { namespace: String, data: Option<Value> },
    Disconnect { namespace: String },
    Event {
        namespace: String,
        name: String,
        data: Value,
    },
    ConnectError { namespace: String, data: Value },
    /// Acks and binary packets, which this client never requests
    Unsupported(char),
}

/// Decode one WebSocket text frame.
pub fn parse_frame(text: &str) -> Result<EnginePacket> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::protocol("empty Engine.IO frame"))?;
    let rest = chars.as_str();

    match kind {
        '0' => {
            let open: OpenPayload = serde_json::from_str(rest)
                .map_err(|e| Error::protocol(format!("bad open packet: {e}")))?;
            Ok(EnginePacket::Open(open))
        }
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(rest.to_string())),
        '3' => Ok(EnginePacket::Pong(rest.to_string())),
        '4' => parse_socket_packet(rest).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        other => Err(Error::protocol(format!(
            "unknown Engine.IO packet type '{other}'"
        ))),
    }
}

fn parse_socket_packet(text: &str) -> Result<SocketPacket> {
    let mut chars = text.chars();
    let kind = chars
        .next()
        .ok_or_else(|| Error::protocol("empty Socket.IO packet"))?;
    let mut rest = chars.as_str();

    // Optional namespace: "/admin,..."
    let mut namespace = "/".to_string();
    if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => {
                namespace = rest[..idx].to_string();
                rest = &rest[idx + 1..];
            }
            None => {
                namespace = rest.to_string();
                rest = "";
            }
        }
    }

    // Optional ack id: leading digits before the JSON body.
    let body = rest.trim_start_matches(|c: char| c.is_ascii_digit());

    let data = if body.is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<Value>(body)
                .map_err(|e| Error::protocol(format!("bad Socket.IO payload: {e}")))?,
        )
    };

    match kind {
        '0' => Ok(SocketPacket::Connect { namespace, data }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let mut items = match data {
                Some(Value::Array(items)) if !items.is_empty() => items,
                _ => return Err(Error::protocol("event packet without [name, ...] array")),
            };
            let name = match items.remove(0) {
                Value::String(name) => name,
                other => {
                    return Err(Error::protocol(format!(
                        "event name is not a string: {other}"
                    )))
                }
            };
            let data = if items.is_empty() {
                Value::Null
            } else {
                items.remove(0)
            };
            Ok(SocketPacket::Event {
                namespace,
                name,
                data,
            })
        }
        '4' => Ok(SocketPacket::ConnectError {
            namespace,
            data: data.unwrap_or(Value::Null),
        }),
        other => Ok(SocketPacket::Unsupported(other)),
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Socket.IO connect to the default namespace.
pub fn encode_connect() -> String {
    "40".to_string()
}

/// Socket.IO disconnect from the default namespace.
pub fn encode_disconnect() -> String {
    "41".to_string()
}

/// Engine.IO pong answering a server ping (echoes its probe payload).
pub fn encode_pong(payload: &str) -> String {
    format!("3{payload}")
}

/// Socket.IO event on the default namespace.
pub fn encode_event(name: &str, data: &Value) -> Result<String> {
    let body = serde_json::to_string(&json!([name, data]))?;
    Ok(format!("42{body}"))
}

/// Encode an outbound message, stamping `seq` on control commands when given.
pub fn encode_outbound(message: &OutboundMessage, seq: Option<u64>) -> Result<String> {
    let mut payload = message.payload.clone();
    if let (Some(seq), Some(name)) = (seq, message.command_name()) {
        if let Value::Object(ref mut map) = payload {
            map.insert("seq".to_string(), json!(seq));
        } else {
            debug!("Not stamping seq on non-object '{}' payload", name);
        }
    }
    encode_event(message.event.as_str(), &payload)
}

// ---------------------------------------------------------------------------
// Event mapping
// ---------------------------------------------------------------------------

/// Map a named Socket.IO event to a typed inbound event.
///
/// Returns `Ok(None)` for events the coordinator does not consume.
pub fn decode_event(name: &str, data: Value) -> Result<Option<InboundEvent>> {
    match name {
        "status" => {
            // The connect-time greeting also carries `status: "connected"`;
            // only `robot_state` matters.
            let Some(state) = data.get("robot_state") else {
                return Ok(None);
            };
            let status: RobotStatus = serde_json::from_value(state.clone())
                .map_err(|e| Error::protocol(format!("bad robot_state: {e}")))?;
            Ok(Some(InboundEvent::Status(status)))
        }
        "robot_response" => Ok(Some(InboundEvent::CommandAck(CommandAck::from_value(data)))),
        "autonomy_changed" => {
            let level = data
                .get("level")
                .cloned()
                .map(serde_json::from_value::<AutonomyLevel>)
                .transpose()
                .map_err(|e| Error::protocol(format!("bad autonomy level: {e}")))?;
            Ok(level.map(InboundEvent::AutonomyChanged))
        }
        _ => Ok(None),
    }
}
