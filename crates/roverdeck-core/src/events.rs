//! Inbound channel events and connectivity state.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::status::{AutonomyLevel, RobotStatus};

/// Connectivity of the control channel.
///
/// Owned by the channel session; upstream code only observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

/// Advisory acknowledgement from the platform.
///
/// The platform makes no promises about its shape, so only the commonly seen
/// keys are pulled out and the raw payload is kept alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandAck {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(skip)]
    pub raw: Value,
}

impl CommandAck {
    pub fn from_value(raw: Value) -> Self {
        let status = raw.get("status").and_then(Value::as_str).map(str::to_string);
        let action = raw.get("action").and_then(Value::as_str).map(str::to_string);
        Self {
            status,
            action,
            raw,
        }
    }
}

/// Typed inbound event from the control channel.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Full authoritative status snapshot
    Status(RobotStatus),
    /// `robot_response` acknowledgement/log line
    CommandAck(CommandAck),
    /// Autonomy level change acknowledged by the platform
    AutonomyChanged(AutonomyLevel),
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            InboundEvent::Status(_) => EventKind::Status,
            InboundEvent::CommandAck(_) | InboundEvent::AutonomyChanged(_) => {
                EventKind::CommandAck
            }
        }
    }
}

/// Subscription key for inbound events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Status,
    CommandAck,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_connection_state_default_is_disconnected() {
        assert_eq!(ConnectionState::default(), ConnectionState::Disconnected);
        assert!(!ConnectionState::Connecting.is_connected());
        assert!(ConnectionState::Connected.is_connected());
    }

    #[test]
    fn test_command_ack_from_platform_response() {
        let ack = CommandAck::from_value(json!({"status": "ok", "action": "move"}));
        assert_eq!(ack.status.as_deref(), Some("ok"));
        assert_eq!(ack.action.as_deref(), Some("move"));
    }

    #[test]
    fn test_command_ack_tolerates_any_shape() {
        let ack = CommandAck::from_value(json!("free text"));
        assert_eq!(ack.status, None);
        assert_eq!(ack.raw, json!("free text"));
    }

    #[test]
    fn test_event_kinds() {
        assert_eq!(
            InboundEvent::Status(RobotStatus::default()).kind(),
            EventKind::Status
        );
        assert_eq!(
            InboundEvent::AutonomyChanged(AutonomyLevel::Auto).kind(),
            EventKind::CommandAck
        );
    }
}
